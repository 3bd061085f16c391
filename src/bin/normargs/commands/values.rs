//! `normargs values` command

use anyhow::{bail, Result};

use crate::cli::ValuesArgs;
use normargs::core::value::join_values;
use normargs::GlobalContext;

pub fn execute(args: ValuesArgs, ctx: &GlobalContext) -> Result<()> {
    let table = ctx.load_availability(&args.file)?;

    match args.key {
        Some(key) => {
            let Some(values) = table.values_of(&key) else {
                bail!(
                    "`{}` is not a key of {}\n\
                     help: Available keys: {}",
                    key,
                    args.file.display(),
                    table.keys().join(", ")
                );
            };
            for value in &values {
                println!("{}", value);
            }
        }
        None => {
            let unique = table.unique_values();
            for key in table.keys() {
                println!("{}: {}", key, join_values(&unique[key]));
            }
        }
    }

    Ok(())
}
