use anyhow::Result;
use billmytime_proto::{connect, read_payload, write_payload, Pair, Payload, Value, SOCKET_PATH};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tokio::io::BufReader;

#[derive(Parser)]
#[command(name = "billmytimectl")]
#[command(about = "Stand in for the phone bridge of a running billmytime", long_about = None)]
struct Cli {
    /// Socket billmytime listens on
    #[arg(long, global = true, default_value = SOCKET_PATH)]
    socket: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a menu on the watch
    Menu {
        kind: MenuKind,
        /// Item titles, in display order
        #[arg(required = true)]
        titles: Vec<String>,
    },
    /// Show a menu with an arbitrary action code
    Raw {
        code: String,
        titles: Vec<String>,
    },
    /// Print every request the watch sends
    Watch,
}

#[derive(Clone, Copy, ValueEnum)]
enum MenuKind {
    Clients,
    Projects,
    Tasks,
}

impl MenuKind {
    fn code(self) -> &'static str {
        match self {
            MenuKind::Clients => "c",
            MenuKind::Projects => "p",
            MenuKind::Tasks => "t",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Menu { kind, titles } => push_menu(&cli.socket, kind.code(), titles).await?,
        Commands::Raw { code, titles } => push_menu(&cli.socket, &code, titles).await?,
        Commands::Watch => watch(&cli.socket).await?,
    }

    Ok(())
}

fn menu_payload(code: &str, titles: Vec<String>) -> Payload {
    let mut pairs = vec![Pair(0, Value::from(code))];
    pairs.extend(
        titles
            .into_iter()
            .enumerate()
            .map(|(i, title)| Pair(i as u32 + 1, Value::Str(title))),
    );
    Payload::from_pairs(pairs)
}

async fn push_menu(socket: &Path, code: &str, titles: Vec<String>) -> Result<()> {
    let mut stream = connect(socket).await?;
    write_payload(&mut stream, &menu_payload(code, titles)).await?;
    println!("OK");
    Ok(())
}

async fn watch(socket: &Path) -> Result<()> {
    let stream = connect(socket).await?;
    let mut reader = BufReader::new(stream);
    while let Some(payload) = read_payload(&mut reader).await? {
        println!("{}", payload);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_payload_numbers_items_from_one() {
        let payload = menu_payload("t", vec!["Design".into(), "Build".into()]);
        assert_eq!(payload.to_string(), r#"0="t" 1="Design" 2="Build""#);
    }

    #[test]
    fn cli_parses_menu_command() {
        let cli = Cli::try_parse_from(["billmytimectl", "menu", "tasks", "Design", "Build"]).unwrap();
        assert_eq!(cli.socket, PathBuf::from(SOCKET_PATH));
        match cli.command {
            Commands::Menu { kind, titles } => {
                assert_eq!(kind.code(), "t");
                assert_eq!(titles, ["Design", "Build"]);
            }
            _ => panic!("Expected menu command"),
        }
    }

    #[test]
    fn menu_needs_titles() {
        assert!(Cli::try_parse_from(["billmytimectl", "menu", "clients"]).is_err());
    }
}
