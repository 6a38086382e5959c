use anyhow::Context;
use app_lettercount::{
    count_order, sort_order, CountMapper, CountReducer, SortMapper, SortReducer,
};
use clap::Parser;
use sequential::{run_stage, to_lines};
use std::{
    fs::{read_to_string, File},
    io::Write,
    path::{Path, PathBuf},
};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
    input_files: Vec<PathBuf>,
}

fn write_lines(path: &Path, lines: &[String]) -> anyhow::Result<()> {
    let mut output_file =
        File::create(path).with_context(|| format!("create {}", path.display()))?;
    for line in lines {
        writeln!(output_file, "{}", line)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut contents = String::new();
    for file in &cli.input_files {
        let text = read_to_string(file).with_context(|| format!("read {}", file.display()))?;
        contents.push_str(&text);
        if !text.ends_with('\n') {
            contents.push('\n');
        }
    }

    let counts = run_stage(&CountMapper, &CountReducer, &count_order(), contents.lines())?;
    let counts = to_lines(&counts);
    write_lines(&cli.output_dir.join("mr-count-seq"), &counts)?;

    let sorted = run_stage(&SortMapper, &SortReducer, &sort_order(), &counts)?;
    write_lines(&cli.output_dir.join("mr-sort-seq"), &to_lines(&sorted))?;

    Ok(())
}
