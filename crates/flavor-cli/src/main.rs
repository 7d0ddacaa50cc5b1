use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use flavor_common::telemetry::{self, TelemetryConfig};
use flavor_common::{
    ApiConfig, AuthStore, FlavorClient, FlavorError, Journal, MediaKind, MediaUpload, User,
};
use flavor_editor_core::{
    EditorSession, JournalForm, MediaStaging, StagingPolicy, SubmissionOutcome, encode_file,
};

mod files;

#[derive(Parser)]
#[command(version, about = "Flavor - keep a cooking journal from the terminal", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the API config file (defaults to <config dir>/flavor/config.json,
    /// then FLAVOR_API_* environment variables)
    #[arg(long, global = true, env = "FLAVOR_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the saved login
    #[arg(long, global = true, env = "FLAVOR_SESSION")]
    session: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and log in with it
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "FLAVOR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and remember the account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FLAVOR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the saved login
    Logout,
    /// Show who is logged in
    Whoami,
    /// List journals
    List {
        /// Only journals written by the logged-in user
        #[arg(long)]
        mine: bool,
    },
    /// Show one journal, with media indices
    Show { id: String },
    /// Delete a journal you wrote
    Delete { id: String },
    /// Write a new journal
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[command(flatten)]
        fields: JournalFields,
    },
    /// Edit a journal you wrote
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        fields: JournalFields,
        /// Drop an existing photo by index (see `show`)
        #[arg(long = "remove-photo", value_name = "INDEX")]
        remove_photos: Vec<usize>,
        /// Drop an existing video by index
        #[arg(long = "remove-video", value_name = "INDEX")]
        remove_videos: Vec<usize>,
        /// Drop an existing audio clip by index
        #[arg(long = "remove-audio", value_name = "INDEX")]
        remove_audio: Vec<usize>,
    },
    /// Add one file to a journal that already has media of that kind
    Upload {
        id: String,
        #[arg(long, value_enum)]
        kind: KindArg,
        file: PathBuf,
    },
}

/// Fields shared by `create` and `edit`.
#[derive(Args)]
struct JournalFields {
    /// Cover image URL
    #[arg(long, conflicts_with = "cover")]
    cover_url: Option<String>,
    /// Cover image file (at most 5 MiB)
    #[arg(long)]
    cover: Option<PathBuf>,
    #[arg(long)]
    ingredients: Option<String>,
    #[arg(long)]
    steps: Option<String>,
    #[arg(long)]
    cooking_time: Option<String>,
    #[arg(long)]
    servings: Option<String>,
    /// Photo to attach (repeatable)
    #[arg(long = "photo", value_name = "FILE")]
    photos: Vec<PathBuf>,
    /// Video to attach (repeatable)
    #[arg(long = "video", value_name = "FILE")]
    videos: Vec<PathBuf>,
    /// Audio clip to attach (repeatable)
    #[arg(long = "audio", value_name = "FILE")]
    audio: Vec<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Photo,
    Video,
    Audio,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Photo => MediaKind::Photos,
            KindArg::Video => MediaKind::Videos,
            KindArg::Audio => MediaKind::Audio,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette()?;
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut telemetry_config = TelemetryConfig::from_env("flavor-cli");
    if cli.quiet {
        telemetry_config = telemetry_config.with_level(tracing::Level::WARN);
    }
    telemetry::init(telemetry_config);

    let mut auth = restore_login(cli.session).await?;

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Logout => {
            auth.clear().await?;
            println!("Logged out");
        }
        Commands::Whoami => match auth.user() {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.id),
            None => println!("Not logged in"),
        },
        Commands::Register {
            name,
            email,
            password,
        } => {
            let client = connect(config)?;
            let user = client.register(&name, &email, &password).await?;
            println!("Welcome, {}!", user.name);
            auth.save(user).await?;
        }
        Commands::Login { email, password } => {
            let client = connect(config)?;
            let user = client.login(&email, &password).await?;
            println!("Logged in as {}", user.name);
            auth.save(user).await?;
        }
        Commands::List { mine } => {
            let client = connect(config)?;
            let user_id = if mine {
                Some(require_user(&auth)?.id.as_str())
            } else {
                None
            };
            let journals = client.list_journals(user_id).await?;
            if journals.is_empty() {
                println!("No journals yet");
            }
            for journal in &journals {
                println!(
                    "{}  {}  ({} media)",
                    journal.id,
                    journal.title,
                    journal.media.total()
                );
            }
        }
        Commands::Show { id } => {
            let user = require_user(&auth)?;
            let client = connect(config)?;
            let journal = client.get_journal(&id, &user.id).await?;
            print_journal(&journal);
        }
        Commands::Delete { id } => {
            let user = require_user(&auth)?;
            let client = connect(config)?;
            let journal = client.get_journal(&id, &user.id).await?;
            require_owner(&journal, user)?;
            client.delete_journal(&id, &user.id).await?;
            println!("Deleted {}", journal.title);
        }
        Commands::Create {
            title,
            description,
            fields,
        } => {
            require_user(&auth)?;
            let client = connect(config)?;
            let mut session = EditorSession::default();
            let form = session.open(None);
            fill_form(form, Some(title), Some(description), &fields).await?;
            let outcome = session.submit(&client, &auth).await?;
            report(&outcome);
        }
        Commands::Edit {
            id,
            title,
            description,
            fields,
            remove_photos,
            remove_videos,
            remove_audio,
        } => {
            let user = require_user(&auth)?;
            let client = connect(config)?;
            let journal = client.get_journal(&id, &user.id).await?;
            require_owner(&journal, user)?;

            let mut session = EditorSession::default();
            let form = session.open(Some(&journal));
            let removals = [
                (MediaKind::Photos, remove_photos),
                (MediaKind::Videos, remove_videos),
                (MediaKind::Audio, remove_audio),
            ];
            for (kind, mut indices) in removals {
                // Indices refer to the listing from `show`, so remove from the back.
                indices.sort_unstable_by(|a, b| b.cmp(a));
                indices.dedup();
                for index in indices {
                    form.remove_existing_media(kind, index)?;
                }
            }
            fill_form(form, title, description, &fields).await?;
            let outcome = session.submit(&client, &auth).await?;
            report(&outcome);
        }
        Commands::Upload { id, kind, file } => {
            let user = require_user(&auth)?;
            let client = connect(config)?;
            let journal = client.get_journal(&id, &user.id).await?;
            require_owner(&journal, user)?;

            let kind = MediaKind::from(kind);
            let staging = MediaStaging::seeded(
                journal.media.clone(),
                StagingPolicy::default().with_require_existing(true),
            );
            let file = select_file(&file).await?;
            staging.check(kind, &file)?;

            let upload = MediaUpload {
                journal_id: journal.id.clone(),
                user_id: user.id.clone(),
                media_type: kind,
                file: encode_file(&file).await?,
            };
            client.upload_media(&upload).await?;
            println!("Uploaded {} to {}", file.name(), journal.title);
        }
    }

    Ok(())
}

async fn restore_login(path: Option<PathBuf>) -> Result<AuthStore, FlavorError> {
    let path = match path {
        Some(path) => path,
        None => AuthStore::default_path()?,
    };
    let auth = AuthStore::load(&path).await?;
    tracing::debug!(
        path = %auth.path().display(),
        logged_in = auth.user().is_some(),
        "restored login"
    );
    Ok(auth)
}

fn connect(config: Option<&Path>) -> Result<FlavorClient, FlavorError> {
    Ok(FlavorClient::new(load_config(config)?)?)
}

/// Config file if one is given or present at the default path, else the
/// environment.
fn load_config(path: Option<&Path>) -> Result<ApiConfig, FlavorError> {
    if let Some(path) = path {
        return Ok(ApiConfig::from_file(path)?);
    }
    match ApiConfig::default_path().filter(|path| path.exists()) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config file");
            Ok(ApiConfig::from_file(path)?)
        }
        None => Ok(ApiConfig::from_env()?),
    }
}

fn require_user(auth: &AuthStore) -> Result<&User> {
    auth.user()
        .ok_or_else(|| miette::miette!(help = "run `flavor login` first", "please log in first"))
}

fn require_owner(journal: &Journal, user: &User) -> Result<()> {
    if journal.user_id != user.id {
        return Err(miette::miette!(
            "only the author of \"{}\" can change it",
            journal.title
        ));
    }
    Ok(())
}

async fn select_file(path: &Path) -> Result<flavor_editor_core::SelectedFile> {
    files::select(path)
        .await
        .into_diagnostic()
        .map_err(|e| e.wrap_err(format!("cannot open {}", path.display())))
}

/// Walk the form through both steps with the values given on the command line.
async fn fill_form(
    form: &mut JournalForm,
    title: Option<String>,
    description: Option<String>,
    fields: &JournalFields,
) -> Result<()> {
    if let Some(title) = title {
        form.set_title(title)?;
    }
    if let Some(description) = description {
        form.set_description(description)?;
    }
    if let Some(url) = &fields.cover_url {
        form.set_cover_url(url.clone())?;
    }
    if let Some(path) = &fields.cover {
        let cover = select_file(path).await?;
        form.select_cover_file(cover).await?;
    }
    form.update_recipe(|recipe| {
        let updates = [
            (&mut recipe.ingredients, &fields.ingredients),
            (&mut recipe.steps, &fields.steps),
            (&mut recipe.cooking_time, &fields.cooking_time),
            (&mut recipe.servings, &fields.servings),
        ];
        for (slot, value) in updates {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
    })?;

    form.next()?;

    let picks = [
        (MediaKind::Photos, &fields.photos),
        (MediaKind::Videos, &fields.videos),
        (MediaKind::Audio, &fields.audio),
    ];
    for (kind, paths) in picks {
        for path in paths {
            let file = select_file(path).await?;
            form.add_media(kind, file).await?;
        }
    }

    let counts = form.media_counts();
    tracing::debug!(
        photos = counts.photos,
        videos = counts.videos,
        audio = counts.audio,
        "form ready"
    );
    Ok(())
}

fn report(outcome: &SubmissionOutcome) {
    match outcome {
        SubmissionOutcome::Created {
            journal_id: Some(id),
        } => println!("Created journal {id}"),
        SubmissionOutcome::Created { journal_id: None } => println!("Created journal"),
        SubmissionOutcome::Updated { journal_id } => println!("Updated journal {journal_id}"),
    }
}

fn print_journal(journal: &Journal) {
    println!("{}  ({})", journal.title, journal.id);
    if let Some(created_at) = &journal.created_at {
        println!("written {created_at}");
    }
    println!();
    println!("{}", journal.description);
    if !journal.cover_image.is_empty() {
        println!();
        println!("cover: {}", journal.cover_image);
    }
    if let Some(recipe) = journal.recipe.as_ref().filter(|recipe| !recipe.is_empty()) {
        println!();
        let rows = [
            ("cooking time", &recipe.cooking_time),
            ("servings", &recipe.servings),
            ("ingredients", &recipe.ingredients),
            ("steps", &recipe.steps),
        ];
        for (label, value) in rows {
            if !value.is_empty() {
                println!("{label}: {value}");
            }
        }
    }
    for (kind, items) in journal.media.iter() {
        if items.is_empty() {
            continue;
        }
        println!();
        println!("{kind}:");
        for (index, item) in items.iter().enumerate() {
            let label = if item.title.is_empty() {
                &item.url
            } else {
                &item.title
            };
            println!("  [{index}] {label}  {}", item.url);
        }
    }
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();
    Ok(())
}
