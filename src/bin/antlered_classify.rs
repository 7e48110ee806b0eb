use std::fs::File;
use std::io::BufReader;

use clap::{Arg, ArgMatches, Command};

use antlered_elk::error::AntleredError;
use antlered_elk::io::reader;
use antlered_elk::reason::Reasoner;
use antlered_elk::vocab::{WithIRI, OWL};

fn main() -> Result<(), AntleredError> {
    let matches = app("antlered-classify").get_matches();
    matcher(&matches)
}

pub(crate) fn app(name: &str) -> Command<'static> {
    Command::new(name)
        .version("0.1")
        .about("Parse an OWL/XML file, classify it and print the entailments.")
        .arg(
            Arg::new("INPUT")
                .help("Sets the input file to use")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("abox")
                .long("abox")
                .takes_value(false)
                .help("Also print the saturated ABox"),
        )
}

pub(crate) fn matcher(matches: &ArgMatches) -> Result<(), AntleredError> {
    let input = matches
        .get_one::<String>("INPUT")
        .ok_or_else(|| AntleredError::CommandError("Command requires a file argument".to_string()))?;

    let file = File::open(input)?;
    let ont = reader::read(BufReader::new(file))?;
    let reasoner = Reasoner::new(ont)?;

    let thing = OWL::Thing.iri_s();
    let mut lines: Vec<String> = reasoner
        .named_subsumptions()
        .iter()
        .filter(|(_, sup)| &sup.0[..] != thing)
        .map(|(sub, sup)| format!("{} SubClassOf {}", sub, sup))
        .collect();
    lines.sort();
    for line in lines {
        println!("{}", line);
    }

    if matches.is_present("abox") {
        let abox = reasoner.saturated_abox();
        let mut lines: Vec<String> = abox
            .class_assertions
            .iter()
            .filter(|row| &row.class_name[..] != thing)
            .map(|row| format!("{} Type {}", row.individual, row.class_name))
            .collect();
        lines.extend(abox.property_assertions.iter().map(|row| {
            format!(
                "{} {} {}",
                row.left_individual, row.object_property, row.right_individual
            )
        }));
        lines.sort();
        for line in lines {
            println!("{}", line);
        }
    }

    let t = reasoner.timings();
    eprintln!(
        "classified in {:?} (normalize {:?}, roles {:?}, classify {:?}, saturate {:?})",
        t.normalize + t.role_hierarchy + t.classify + t.saturate,
        t.normalize,
        t.role_hierarchy,
        t.classify,
        t.saturate
    );

    Ok(())
}
