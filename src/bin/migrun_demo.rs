use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use migrun::{Direction, FileStore, Migration, Migrator, PersistentStore};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "migrun-demo")]
#[command(about = "Runs a sample users migration set against a JSON file")]
struct Cli {
    /// Directory holding the users collection and the migration state file
    #[arg(long, default_value = ".migrun-demo")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply migrations up to TARGET (default: all)
    Up { target: Option<String> },
    /// Undo migrations down to TARGET (default: all)
    Down { target: Option<String> },
    /// Show the steps a run would execute
    Plan {
        #[arg(value_enum)]
        direction: DirectionArg,
        target: Option<String>,
    },
    /// Show applied and pending migrations
    Status,
    /// Reset, migrate everything, then undo the full-name migration
    Walkthrough,
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Up => Direction::Up,
            DirectionArg::Down => Direction::Down,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    tokio::fs::create_dir_all(&cli.data_dir)
        .await
        .with_context(|| format!("Failed to create data directory '{}'", cli.data_dir.display()))?;

    let users = Arc::new(UsersFile::new(cli.data_dir.join("users.json")));
    let store = FileStore::new(cli.data_dir.join(".migration"));
    let migrator = Migrator::new(store.clone(), user_migrations(users.clone()))?;
    migrator.on_migration_end(|event| println!("{} {}", event.direction, event.name))?;

    match cli.command {
        Command::Up { target } => {
            migrator.up(target.as_deref()).await?;
        }
        Command::Down { target } => {
            migrator.down(target.as_deref()).await?;
        }
        Command::Plan { direction, target } => {
            let plan = migrator.plan(direction.into(), target.as_deref()).await?;
            if plan.is_empty() {
                println!("Nothing to do");
            }
            for (index, name) in plan.step_names().iter().enumerate() {
                println!("{:>3}  {}", index, name);
            }
        }
        Command::Status => {
            let status = migrator.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Walkthrough => {
            store.save(None).await?;
            users.drop_collection().await?;

            migrator.up(None).await?;
            println!("\nUsers:");
            println!("{}", serde_json::to_string_pretty(&users.read().await?)?);

            migrator.down(Some("4-add-full-user-name")).await?;
            println!("\nWithout full name:");
            println!("{}", serde_json::to_string_pretty(&users.read().await?)?);
        }
    }

    Ok(())
}

// ============================================================================
// Users collection
// ============================================================================

/// A JSON array of user documents kept in a single file.
struct UsersFile {
    path: PathBuf,
}

impl UsersFile {
    fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn read(&self) -> Result<Vec<Value>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Users collection '{}' does not exist", self.path.display()))?;
        serde_json::from_str(&raw).context("Users collection is not a JSON array")
    }

    async fn write(&self, users: &[Value]) -> Result<()> {
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(users)?)
            .await
            .with_context(|| format!("Failed to write '{}'", self.path.display()))
    }

    async fn drop_collection(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn map<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&mut serde_json::Map<String, Value>) -> Result<()>,
    {
        let mut users = self.read().await?;
        for user in users.iter_mut() {
            let fields = user
                .as_object_mut()
                .ok_or_else(|| anyhow!("User document is not an object"))?;
            f(fields)?;
        }
        self.write(&users).await
    }
}

fn capitalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn field<'a>(fields: &'a serde_json::Map<String, Value>, key: &str) -> Result<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("User is missing string field '{}'", key))
}

fn user_migrations(users: Arc<UsersFile>) -> Vec<Migration> {
    let create = users.clone();
    let insert = users.clone();
    let trim = users.clone();
    let capitalize_names = users.clone();
    let add_full_name = users.clone();
    let remove_full_name = users;

    vec![
        Migration::new("0-create-users", move || {
            let users = create.clone();
            async move { users.write(&[]).await }
        }),
        Migration::new("1-insert-users", move || {
            let users = insert.clone();
            async move {
                let mut all = users.read().await?;
                all.extend([
                    json!({"firstName": "Rayford", "lastName": " dowler"}),
                    json!({"firstName": "KISHA", "lastName": "MArroquin"}),
                    json!({"firstName": "dierdre ", "lastName": "friend  "}),
                ]);
                users.write(&all).await
            }
        }),
        Migration::reversible(
            "2-trim-user-names",
            move || {
                let users = trim.clone();
                async move {
                    users
                        .map(|user| {
                            let first = field(user, "firstName")?.trim().to_string();
                            let last = field(user, "lastName")?.trim().to_string();
                            user.insert("firstName".into(), json!(first));
                            user.insert("lastName".into(), json!(last));
                            Ok(())
                        })
                        .await
                }
            },
            || async { Ok(()) },
        ),
        Migration::reversible(
            "3-capitalize-user-names",
            move || {
                let users = capitalize_names.clone();
                async move {
                    users
                        .map(|user| {
                            let first = capitalize(field(user, "firstName")?);
                            let last = capitalize(field(user, "lastName")?);
                            user.insert("firstName".into(), json!(first));
                            user.insert("lastName".into(), json!(last));
                            Ok(())
                        })
                        .await
                }
            },
            || async { Ok(()) },
        ),
        Migration::reversible(
            "4-add-full-user-name",
            move || {
                let users = add_full_name.clone();
                async move {
                    users
                        .map(|user| {
                            let full = format!(
                                "{} {}",
                                field(user, "firstName")?,
                                field(user, "lastName")?
                            );
                            user.insert("fullName".into(), json!(full));
                            Ok(())
                        })
                        .await
                }
            },
            move || {
                let users = remove_full_name.clone();
                async move {
                    users
                        .map(|user| {
                            user.remove("fullName");
                            Ok(())
                        })
                        .await
                }
            },
        ),
    ]
}
