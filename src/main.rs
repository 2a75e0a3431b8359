use std::path::{Path, PathBuf};

use almanac::build::build_site;
use almanac::config::Project;
use clap::{App, Arg};

fn main() {
    let matches = App::new("almanac")
        .about("A batch static site generator for date-archived, tagged blogs")
        .arg(
            Arg::with_name("project")
                .help("The project directory (or any directory beneath it)")
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .help("The output directory (defaults to `<project>/_site`)"),
        )
        .get_matches();

    let project_directory =
        Path::new(matches.value_of("project").unwrap_or("."));
    let output_directory = matches.value_of("output").map(PathBuf::from);

    let project =
        match Project::from_directory(project_directory, output_directory) {
            Ok(project) => project,
            Err(err) => {
                eprintln!("{:#}", err);
                std::process::exit(1);
            }
        };

    if let Err(err) = build_site(&project) {
        if err.is_validation() {
            // Displays as one diagnostic per violation, paths included.
            eprintln!("{}", err);
        } else {
            eprintln!("almanac: {}", err);
        }
        std::process::exit(1);
    }
}
