use std::fs::File;
use std::io::{stdout, BufReader, BufWriter};

use clap::{Arg, ArgMatches, Command};

use antlered_elk::error::AntleredError;
use antlered_elk::io::{reader, writer};

fn main() -> Result<(), AntleredError> {
    let matches = app("antlered-round").get_matches();
    matcher(&matches)
}

pub(crate) fn app(name: &str) -> Command<'static> {
    Command::new(name)
        .version("0.1")
        .about("Parse an OWL/XML file and write it back out.")
        .arg(
            Arg::new("INPUT")
                .help("Sets the input file to use")
                .required(true)
                .index(1),
        )
}

pub(crate) fn matcher(matches: &ArgMatches) -> Result<(), AntleredError> {
    let input = matches
        .get_one::<String>("INPUT")
        .ok_or_else(|| AntleredError::CommandError("Command requires a file argument".to_string()))?;

    let file = File::open(input)?;
    let ont = reader::read(BufReader::new(file))?;

    let out = stdout();
    writer::write(BufWriter::new(out.lock()), &ont)?;
    println!();

    Ok(())
}
