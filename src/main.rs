use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sealbox::{Algorithm, Key, PasswordConfig, Secret, SecurityLevel, Storage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

mod auth;

#[derive(Debug, clap::Args)]
struct KdfArgs {
    /// Argon2 cost preset: interactive, moderate or sensitive
    #[arg(long, default_value_t = SecurityLevel::default())]
    level: SecurityLevel,

    /// Password hashing algorithm: argon2id13 or argon2i13
    #[arg(long, default_value_t = Algorithm::recommended())]
    algorithm: Algorithm,

    /// Argon2 passes, overriding the preset
    #[arg(long)]
    ops_limit: Option<u64>,

    /// Argon2 memory in bytes, overriding the preset
    #[arg(long)]
    mem_limit: Option<u64>,
}

impl KdfArgs {
    fn to_config(&self) -> sealbox::Result<PasswordConfig> {
        let preset = PasswordConfig::preset(self.level, self.algorithm);

        PasswordConfig::new(
            self.algorithm,
            self.ops_limit.unwrap_or(preset.ops_limit()),
            self.mem_limit.unwrap_or(preset.mem_limit()),
        )
    }
}

#[derive(Debug, Parser)]
#[command(name = "sealbox")]
#[command(
    version,
    about = "Seal files with authenticated encryption under a key or password."
)]
struct Cli {
    /// Log filter used when SEALBOX_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Writes a new random key file
    Keygen {
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
    },

    /// Encrypts a file under a password, or a key file if given
    Seal {
        #[arg(long = "in", value_name = "PATH")]
        input: PathBuf,

        #[arg(long, value_name = "PATH")]
        out: PathBuf,

        #[arg(long, value_name = "PATH", env = "SEALBOX_KEY_FILE")]
        key_file: Option<PathBuf>,

        #[command(flatten)]
        kdf: KdfArgs,
    },

    /// Decrypts a sealed file
    Open {
        #[arg(long = "in", value_name = "PATH")]
        input: PathBuf,

        #[arg(long, value_name = "PATH")]
        out: PathBuf,

        #[arg(long, value_name = "PATH", env = "SEALBOX_KEY_FILE")]
        key_file: Option<PathBuf>,
    },

    /// Prints the header of a sealed file as JSON
    Inspect {
        #[arg(long = "in", value_name = "PATH")]
        input: PathBuf,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env("SEALBOX_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_key(path: &Path) -> Result<Key> {
    let bytes = Zeroizing::new(
        Storage::new(path)
            .load()
            .with_context(|| format!("failed to read key file {}", path.display()))?,
    );
    Key::from_bytes(&bytes).context("invalid key file")
}

fn fresh_output(path: PathBuf) -> Result<Storage> {
    let storage = Storage::new(path);
    if storage.exists() {
        bail!("{} already exists", storage.path().display());
    }
    Ok(storage)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Keygen { out } => {
            let storage = fresh_output(out)?;
            let key = Key::random()?;
            storage.save(key.bytes().as_slice())?;
            key.release();
            println!("key written to {}", storage.path().display());
        }

        Commands::Seal {
            input,
            out,
            key_file,
            kdf,
        } => {
            let output = fresh_output(out)?;
            let plaintext = Zeroizing::new(
                Storage::new(&input)
                    .load()
                    .with_context(|| format!("failed to read {}", input.display()))?,
            );

            let sealed = match key_file {
                Some(path) => {
                    let key = load_key(&path)?;
                    sealbox::seal_with_key(&plaintext, &key)?
                }
                None => {
                    let config = kdf.to_config()?;
                    let password = auth::read_new_password()?;
                    sealbox::seal_with_password(&plaintext, password.as_str(), &config)?
                }
            };

            output.save(&sealed)?;
            println!("sealed {} -> {}", input.display(), output.path().display());
        }

        Commands::Open {
            input,
            out,
            key_file,
        } => {
            let data = Storage::new(&input)
                .load()
                .with_context(|| format!("failed to read {}", input.display()))?;
            let info = sealbox::inspect(&data)?;

            let opened = match (key_file, info.kdf) {
                (Some(path), _) => {
                    let key = load_key(&path)?;
                    sealbox::open(&data, Secret::Key(&key))?
                }
                (None, Some(_)) => {
                    let password = auth::read_password()?;
                    sealbox::open(&data, Secret::Password(password.as_str()))?
                }
                (None, None) => bail!("{} was sealed with a key; pass --key-file", input.display()),
            };

            let Some(plaintext) = opened else {
                bail!("authentication failed: wrong password/key or corrupted data");
            };

            let output = Storage::new(out);
            output.save(&plaintext)?;
            println!("opened {} -> {}", input.display(), output.path().display());
        }

        Commands::Inspect { input } => {
            let data = Storage::new(&input)
                .load()
                .with_context(|| format!("failed to read {}", input.display()))?;
            let info = sealbox::inspect(&data)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
