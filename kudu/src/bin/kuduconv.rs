use std::fs;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{OptionExt, WrapErr};
use color_eyre::Result;

use kudu::abi::{json_to_value, value_to_json};
use kudu::config::BuildParams;
use kudu::Context;

#[derive(Parser)]
#[command(
    name = "kuduconv",
    version,
    about = "Utility to convert JSON to/from hex data according to an ABI",
    arg_required_else_help(true)
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a JSON object to its hex representation
    ToHex {
        #[arg(short, long)]
        abi: String,

        typename: String,

        json: String,
    },

    /// Parse hex data as a JSON object
    FromHex {
        #[arg(short, long)]
        abi: String,

        typename: String,

        hex: String,
    },
}

fn read_abi(path: &str) -> Result<String> {
    fs::read_to_string(path).wrap_err_with(|| format!("could not read ABI file '{path}'"))
}

pub fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let cmd = cli.command.ok_or_eyre("no command given, specify `to-hex` or `from-hex`")?;
    let mut ctx = Context::new(None, false)?;

    match cmd {
        Commands::ToHex { abi, typename, json } => {
            let abi_text = read_abi(&abi)?;
            let view = kudu::ABIView::from_document(&kudu::AbiDocument::parse_contract_abi(&abi_text)?)?;
            let (_key, artifact) = ctx.module_for_abi(&abi, view.clone(), false, BuildParams::default())?;

            let parsed: serde_json::Value = json.parse().wrap_err("invalid JSON argument")?;
            let value = json_to_value(&view, &typename, &parsed)?;
            let bytes = artifact.pack(&view, &typename, &value)?;

            println!("{}", hex::encode(bytes));
        }

        Commands::FromHex { abi, typename, hex } => {
            let abi_text = read_abi(&abi)?;
            let view = kudu::ABIView::from_document(&kudu::AbiDocument::parse_contract_abi(&abi_text)?)?;
            let (_key, artifact) = ctx.module_for_abi(&abi, view.clone(), false, BuildParams::default())?;

            let bytes = hex::decode(hex.trim()).wrap_err("invalid hex argument")?;
            let value = artifact.unpack(&view, &typename, &bytes)?;
            let json = value_to_json(&view, &typename, &value)?;

            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}
