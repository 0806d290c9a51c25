use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use pictura::config::Config;
use pictura::models::ResourceId;
use pictura::params::{PageRequest, QueryParams};
use pictura::requests::auth::Credentials;
use pictura::requests::photos::PhotoQuery;
use pictura::Pictura;

#[derive(Parser, Debug)]
#[command(name = "pictura")]
#[command(about = "Command line client for the photo-sharing API")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/pictura/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API base URL, overrides the config file
  #[arg(long)]
  base_url: Option<String>,

  /// Keep credentials in memory for this run only
  #[arg(long)]
  in_memory: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Log in; the password is read from PICTURA_PASSWORD
  Login {
    #[arg(short, long)]
    email: Option<String>,
  },
  /// Log out and forget stored credentials
  Logout,
  /// Show a user's profile
  Profile { username: String },
  #[command(subcommand)]
  Photos(PhotosCommand),
  /// List a user's collections
  Collections {
    user_id: String,
    #[arg(short, long, default_value_t = 1)]
    page: u32,
  },
  /// List all categories
  Categories,
  /// Show the comments on a photo
  Comments {
    photo_id: String,
    #[arg(short, long, default_value_t = 1)]
    page: u32,
  },
  /// Like or unlike a photo
  Like { photo_id: String },
  /// Follow or unfollow a user
  Follow { username: String },
}

#[derive(Subcommand, Debug)]
enum PhotosCommand {
  /// List photos
  List {
    #[arg(short, long, default_value_t = 1)]
    page: u32,
    #[arg(short, long)]
    search: Option<String>,
    #[arg(short, long)]
    user: Option<String>,
    #[arg(short, long)]
    ordering: Option<String>,
  },
  /// Show one photo
  Get { id: String },
  /// Photos from followed users
  Feed,
  Trending,
  Featured,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging()?;

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(base_url) = args.base_url {
    config.api.base_url = base_url;
  }
  if args.in_memory {
    config.credentials.in_memory = true;
  }

  let app = Pictura::new(&config)?;
  run(&app, &config, args.command).await
}

async fn run(app: &Pictura, config: &Config, command: Command) -> Result<()> {
  match command {
    Command::Login { email } => {
      let email = email
        .or_else(|| config.email.clone())
        .ok_or_else(|| eyre!("No email given. Pass --email or set `email` in the config file."))?;
      let credentials = Credentials {
        email,
        password: Config::get_password()?,
      };
      app.auth.login(&credentials).await?;
      println!("Logged in as {}", credentials.email);
    }
    Command::Logout => {
      app.logout().await?;
      println!("Logged out");
    }
    Command::Profile { username } => print(&app.users.get_user_profile(&username).await?)?,
    Command::Photos(command) => match command {
      PhotosCommand::List {
        page,
        search,
        user,
        ordering,
      } => {
        let query = PhotoQuery {
          page: PageRequest {
            page,
            ..Default::default()
          },
          search,
          username: user,
          ordering,
          ..Default::default()
        };
        print(&app.photos.list_photos(&query).await?)?;
      }
      PhotosCommand::Get { id } => print(&app.photos.get_photo(&ResourceId::from(id)).await?)?,
      PhotosCommand::Feed => print(&app.photos.get_feed(&QueryParams::new()).await?)?,
      PhotosCommand::Trending => print(&app.photos.get_trending(&QueryParams::new()).await?)?,
      PhotosCommand::Featured => print(&app.photos.get_featured(&QueryParams::new()).await?)?,
    },
    Command::Collections { user_id, page } => {
      let page = PageRequest {
        page,
        ..Default::default()
      };
      print(
        &app
          .collections
          .get_user_collections(&ResourceId::from(user_id), page)
          .await?,
      )?;
    }
    Command::Categories => print(&app.categories.get_all().await?)?,
    Command::Comments { photo_id, page } => {
      print(&app.comments.get_photo_comments(&ResourceId::from(photo_id), page).await?)?
    }
    Command::Like { photo_id } => print(&app.likes.toggle_like(&ResourceId::from(photo_id)).await?)?,
    Command::Follow { username } => print(&app.followers.toggle_follow(&username).await?)?,
  }

  // deliver anything still coalescing before the runtime goes away
  app.sync().flush();
  Ok(())
}

fn print<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// Log to a file in the data directory so stdout stays machine readable.
///
/// The filter comes from PICTURA_LOG and defaults to `info`.
fn init_logging() -> Result<WorkerGuard> {
  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("pictura");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let appender = tracing_appender::rolling::never(&log_dir, "pictura.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env("PICTURA_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
  let fmt_layer = tracing_subscriber::fmt::layer()
    .with_writer(writer)
    .with_ansi(false);
  tracing_subscriber::registry()
    .with(filter)
    .with(fmt_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
