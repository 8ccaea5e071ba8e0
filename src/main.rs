mod api;
mod app;
mod authz;
mod config;
mod error;
mod logging;
mod models;
mod navigation;
mod pages;
mod ports;
mod routes;
mod services;
mod session;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context, bail},
};

use crate::{
    app::App,
    config::Config,
    logging::{SERVICE_NAME, init_tracing},
    models::{
        AlbumDraft, AlbumPatch, ArtistDraft, ArtistPatch, Attachment, Genre, SongDraft, SongPatch,
    },
    navigation::History,
    pages::{Outcome, PageContext},
    routes::{NEUTRAL_PATH, Route},
    services::http::{HttpTransport, session_file::SessionFile},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "MUSIC_CATALOG_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the catalog API, overriding the config file
    #[arg(long, global = true, env = "MUSIC_CATALOG_API_URL")]
    api_url: Option<String>,

    /// Log filter, e.g. `debug` or `music_catalog=trace` (default: from config)
    #[arg(long, global = true, env = "LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the page at PATH, e.g. `/artists/7`
    Open { path: String },
    /// Sign in and keep the session for later commands
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Print the signed-in identity
    Whoami,
    /// Change the signed-in account's password
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        repeat: String,
    },
    #[command(subcommand)]
    Artist(ArtistCommands),
    #[command(subcommand)]
    Album(AlbumCommands),
    #[command(subcommand)]
    Song(SongCommands),
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ArtistCommands {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        bio: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        birth_date: Option<NaiveDate>,
        #[arg(long)]
        country: Option<String>,
    },
    /// Update the given fields, leaving the rest unchanged
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        birth_date: Option<NaiveDate>,
        #[arg(long)]
        country: Option<String>,
    },
    Delete {
        id: i64,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AlbumCommands {
    Create {
        /// Artist the album belongs to
        #[arg(long)]
        artist: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        release_date: Option<NaiveDate>,
        /// Cover image file
        #[arg(long)]
        cover: Option<PathBuf>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        artist: Option<i64>,
        #[arg(long)]
        release_date: Option<NaiveDate>,
        #[arg(long)]
        cover: Option<PathBuf>,
    },
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SongCommands {
    Create {
        /// Album the song is added to
        #[arg(long)]
        album: i64,
        #[arg(long)]
        title: String,
        /// Audio file to upload
        #[arg(long)]
        audio: PathBuf,
        #[arg(long, default_value_t = Genre::Other)]
        genre: Genre,
        #[arg(long)]
        release_date: Option<NaiveDate>,
        #[arg(long)]
        cover: Option<PathBuf>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        album: Option<i64>,
        #[arg(long)]
        genre: Option<Genre>,
        #[arg(long)]
        release_date: Option<NaiveDate>,
        #[arg(long)]
        audio: Option<PathBuf>,
        #[arg(long)]
        cover: Option<PathBuf>,
    },
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load music-catalog config")?
    .with_api_url(args.api_url);

    let log_level = args
        .log_level
        .unwrap_or_else(|| config.log_level().to_string());
    let tracer_provider = init_tracing(SERVICE_NAME, config.otlp_endpoint(), &log_level)?;
    tracing::debug!("Music catalog starting");

    let result = match args.command {
        Commands::Config(config_commands) => run_config_command(config_commands),
        command => run(command, &config).await,
    };

    if let Some(tracer_provider) = tracer_provider {
        if let Err(error) = tracer_provider.shutdown() {
            eprintln!("Failed to flush traces: {}", error);
        }
    }

    result
}

fn run_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::CreateDefault => {
            tracing::debug!("Creating default config");
            let path = Config::create_default()?;
            tracing::info!("Default config created at {}", path.display());
        }
        ConfigCommands::Path => match Config::config_path() {
            Some(path) => println!("{}", path.display()),
            None => println!("No default config path found"),
        },
    }
    Ok(())
}

/// Runs one command against the API, then renders wherever it left the
/// navigator and persists the session cookie.
async fn run(command: Commands, config: &Config) -> Result<()> {
    let transport = Arc::new(HttpTransport::new(
        config.api_url()?,
        config.request_timeout()?,
    )?);
    tracing::debug!("Using catalog API at {}", transport.base_url());

    let session_file = config.session_file_path().map(SessionFile::new);
    if let Some(session_file) = &session_file {
        tracing::debug!("Session file: {}", session_file.path().display());
        if let Some(cookies) = session_file.load()? {
            transport.restore_cookies(&cookies);
        }
    }

    let app = App::new(transport.clone(), Arc::new(History::new(NEUTRAL_PATH)));
    app.start().await;

    let outcome = dispatch(&app, command).await?;
    if let Some(outcome) = outcome {
        print!("{}", outcome);
    }
    println!("{}", app.render_current().await);

    if let Some(session_file) = &session_file {
        // Keep the cookie only while it still identifies someone.
        let cookies = app
            .context()
            .session
            .identity()
            .and_then(|_| transport.cookies());
        session_file
            .save(cookies.as_deref())
            .wrap_err("Failed to save session")?;
    }
    Ok(())
}

async fn attachment(path: Option<PathBuf>) -> Result<Option<Attachment>> {
    match path {
        Some(path) => Ok(Some(Attachment::from_path(&path).await?)),
        None => Ok(None),
    }
}

fn confirm(yes: bool, what: &str) -> Result<()> {
    if !yes {
        bail!("Refusing to delete {} without --yes", what);
    }
    Ok(())
}

/// Runs `command`. `None` means the command only moved the navigator.
async fn dispatch(app: &App, command: Commands) -> Result<Option<Outcome>> {
    let ctx: &PageContext = app.context();
    let outcome = match command {
        Commands::Open { path } => {
            app.open(&path).await;
            return Ok(None);
        }
        Commands::Whoami => {
            match ctx.session.identity() {
                Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
                None => println!("Not signed in"),
            }
            return Ok(None);
        }
        Commands::Login { email, password } => {
            app.enter(&Route::Login);
            pages::auth::login(ctx, &email, &password).await
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            app.enter(&Route::Register);
            pages::auth::register(ctx, &name, &email, &password).await
        }
        Commands::Logout => pages::auth::logout(ctx).await,
        Commands::ChangePassword {
            current,
            new,
            repeat,
        } => {
            if !app.enter(&Route::Settings) {
                return Ok(None);
            }
            pages::auth::change_password(ctx, &current, &new, &repeat).await
        }
        Commands::Artist(command) => match command {
            ArtistCommands::Create {
                name,
                bio,
                birth_date,
                country,
            } => {
                if !app.enter(&Route::ArtistCreate) {
                    return Ok(None);
                }
                let draft = ArtistDraft {
                    name,
                    bio,
                    birth_date,
                    country,
                };
                pages::artists::create(ctx, draft).await
            }
            ArtistCommands::Edit {
                id,
                name,
                bio,
                birth_date,
                country,
            } => {
                if !app.enter(&Route::ArtistEdit(id)) {
                    return Ok(None);
                }
                let patch = ArtistPatch {
                    name,
                    bio,
                    birth_date,
                    country,
                };
                pages::artists::edit(ctx, id, patch).await
            }
            ArtistCommands::Delete { id, yes } => {
                confirm(yes, "artist")?;
                if !app.enter(&Route::Artist(id)) {
                    return Ok(None);
                }
                pages::artists::delete(ctx, id).await
            }
        },
        Commands::Album(command) => match command {
            AlbumCommands::Create {
                artist,
                title,
                release_date,
                cover,
            } => {
                if !app.enter(&Route::AlbumCreate(artist)) {
                    return Ok(None);
                }
                let draft = AlbumDraft {
                    title,
                    artist_id: artist,
                    release_date,
                    cover_image: attachment(cover).await?,
                };
                pages::albums::create(ctx, draft).await
            }
            AlbumCommands::Edit {
                id,
                title,
                artist,
                release_date,
                cover,
            } => {
                if !app.enter(&Route::AlbumEdit(id)) {
                    return Ok(None);
                }
                let patch = AlbumPatch {
                    title,
                    artist_id: artist,
                    release_date,
                    cover_image: attachment(cover).await?,
                };
                pages::albums::edit(ctx, id, patch).await
            }
            AlbumCommands::Delete { id, yes } => {
                confirm(yes, "album")?;
                if !app.enter(&Route::Album(id)) {
                    return Ok(None);
                }
                pages::albums::delete(ctx, id).await
            }
        },
        Commands::Song(command) => match command {
            SongCommands::Create {
                album,
                title,
                audio,
                genre,
                release_date,
                cover,
            } => {
                if !app.enter(&Route::SongCreate(album)) {
                    return Ok(None);
                }
                let draft = SongDraft {
                    title,
                    album_id: album,
                    release_date,
                    genre,
                    audio_file: Attachment::from_path(&audio).await?,
                    cover_image: attachment(cover).await?,
                };
                pages::songs::create(ctx, draft).await
            }
            SongCommands::Edit {
                id,
                title,
                album,
                genre,
                release_date,
                audio,
                cover,
            } => {
                if !app.enter(&Route::SongEdit(id)) {
                    return Ok(None);
                }
                let patch = SongPatch {
                    title,
                    album_id: album,
                    release_date,
                    genre,
                    audio_file: attachment(audio).await?,
                    cover_image: attachment(cover).await?,
                };
                pages::songs::edit(ctx, id, patch).await
            }
            SongCommands::Delete { id, yes } => {
                confirm(yes, "song")?;
                if !app.enter(&Route::Songs) {
                    return Ok(None);
                }
                pages::songs::delete(ctx, id).await
            }
        },
        Commands::Config(_) => return Ok(None),
    };
    Ok(Some(outcome))
}
