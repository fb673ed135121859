// Command line front end for the MySQL administration helpers.
//
// Connections come from DATABASE_DSN / DATABASE_DSN_<NAME>, optionally on top
// of a JSON file named by DBUTIL_CONFIG. Logging is controlled by RUST_LOG.

use anyhow::{Context, Result, bail};
use kodegen_tools_dbutil::{ColumnSpec, DbUtil, DbUtilConfig, MySqlSchemaBuilder, PoolRegistry};

const USAGE: &str = "\
usage: kodegen-dbutil [--connection NAME] <command>

commands:
  tables                        list tables of the current database
  databases                     list databases
  columns <table>               list columns of a table
  truncate <table>              empty a table
  optimize <table>              optimize a table
  drop <table>                  drop a table
  create <table> <columns-json> create a table with an id column, e.g.
                                '[{\"name\":\"email\",\"type\":\"string\",\"length\":255}]'";

// ============================================================================
// ARGUMENT PARSING
// ============================================================================

#[derive(Debug, PartialEq)]
enum Command {
    Tables,
    Databases,
    Columns(String),
    Truncate(String),
    Optimize(String),
    Drop(String),
    Create { table: String, columns: Vec<ColumnSpec> },
}

#[derive(Debug, PartialEq)]
struct Invocation {
    connection: Option<String>,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut connection = None;
    let mut rest = args;

    if let Some(first) = rest.first()
        && (first == "--connection" || first == "-c")
    {
        let name = rest
            .get(1)
            .context("--connection requires a connection name")?;
        connection = Some(name.to_lowercase());
        rest = &rest[2..];
    }

    let words: Vec<&str> = rest.iter().map(String::as_str).collect();
    let command = match words.as_slice() {
        ["tables"] => Command::Tables,
        ["databases"] => Command::Databases,
        ["columns", table] => Command::Columns(table.to_string()),
        ["truncate", table] => Command::Truncate(table.to_string()),
        ["optimize", table] => Command::Optimize(table.to_string()),
        ["drop", table] => Command::Drop(table.to_string()),
        ["create", table, json] => Command::Create {
            table: table.to_string(),
            columns: serde_json::from_str(json).context("Invalid column JSON")?,
        },
        [] => bail!("missing command\n\n{}", USAGE),
        other => bail!("unrecognized arguments: {}\n\n{}", other.join(" "), USAGE),
    };

    Ok(Invocation {
        connection,
        command,
    })
}

fn load_config() -> Result<DbUtilConfig> {
    match std::env::var("DBUTIL_CONFIG") {
        Ok(path) => {
            let mut config = DbUtilConfig::from_json_file(&path)?;
            config.apply_vars(std::env::vars())?;
            Ok(config)
        }
        Err(_) => DbUtilConfig::from_env(),
    }
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if matches!(args.first().map(String::as_str), Some("-h" | "--help")) {
        println!("{}", USAGE);
        return Ok(());
    }

    let invocation = parse_args(&args)?;
    let config = load_config().context("Failed to load configuration")?;
    let util = DbUtil::new(PoolRegistry::new(config), MySqlSchemaBuilder);

    let result = run(&util, invocation).await;
    util.provider().close().await;
    result
}

async fn run(util: &DbUtil<PoolRegistry, MySqlSchemaBuilder>, invocation: Invocation) -> Result<()> {
    let connection = invocation.connection.as_deref();

    let names = match invocation.command {
        Command::Tables => util.list_tables(connection).await?,
        Command::Databases => util.list_databases(connection).await?,
        Command::Columns(table) => util.list_columns(&table, connection).await?,
        Command::Truncate(table) => {
            let outcome = util.truncate(&table, connection).await?;
            println!("rows affected: {}", outcome.rows_affected);
            return Ok(());
        }
        Command::Optimize(table) => {
            for message in util.optimize(&table, connection).await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    message.table, message.op, message.msg_type, message.msg_text
                );
            }
            return Ok(());
        }
        Command::Drop(table) => {
            let outcome = util.drop_table(&table, connection).await?;
            println!("rows affected: {}", outcome.rows_affected);
            return Ok(());
        }
        Command::Create { table, columns } => {
            util.create_table(&table, &columns, connection).await?;
            println!("created {}", table);
            return Ok(());
        }
    };

    for name in names {
        println!("{}", name);
    }
    Ok(())
}
