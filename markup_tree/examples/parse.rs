use markup_tree::{config::ParseOptions, parse_with_diagnostics};
use std::{env, fs, io};

fn main() -> anyhow::Result<()> {
    let file_path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: parse <file>"))?;
    let code = fs::read_to_string(file_path)?;
    let options = match fs::read_to_string("markup_tree.toml") {
        Ok(s) => toml::from_str(&s)?,
        Err(error) => {
            if error.kind() == io::ErrorKind::NotFound {
                ParseOptions::default()
            } else {
                return Err(error.into());
            }
        }
    };

    let output = parse_with_diagnostics(&code, &options);
    for diagnostic in &output.diagnostics {
        eprintln!("{diagnostic}");
    }
    println!("{}", serde_json::to_string_pretty(&output.root)?);
    Ok(())
}
