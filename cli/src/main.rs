mod console;

use anyhow::{Context, bail};
use atelier_core::catalog::parse_price;
use atelier_core::{
    AdminGate, Catalog, CleanupStatus, ImageDropHandler, ImageKey, ImageReplacer, ImageTranscoder, NewProduct,
    ProductField, ProductId, ReplacePolicy, SlotKey, StoreLayout, WebpTranscoder,
};
use atelier_supabase::{Supabase, SupabaseProject};
use clap::Parser;
use clap_derive::{Parser, Subcommand};
use config::{PathManager, Settings, load_env_file};
use console::{ConsoleNotifier, ConsoleSlot, read_image};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Manage the images and catalog of the atelier site", long_about = None)]
struct Args {
    #[arg(long, short, global = true)]
    tracing: bool,

    /// Project URL (overrides settings)
    #[arg(long, env = "SUPABASE_URL", global = true)]
    url: Option<String>,

    /// Project API key (overrides settings)
    #[arg(long, env = "SUPABASE_KEY", global = true, hide_env_values = true)]
    key: Option<String>,

    /// Administrator email (overrides settings)
    #[arg(long, env = "ATELIER_EMAIL", global = true)]
    email: Option<String>,

    #[arg(long, env = "ATELIER_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    /// Keep superseded images in storage
    #[arg(long, global = true)]
    keep_old: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show or change stored settings
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Transcode a local image the way uploads are, without uploading
    Compress { input: PathBuf, output: PathBuf },
    /// Replace the image of a content slot
    Slot { key: String, file: PathBuf },
    /// Replace the image of a product
    ProductImage { id: String, file: PathBuf },
    #[command(subcommand)]
    Product(ProductCommand),
    /// Save the text of a content slot
    Content { key: String, text: String },
    /// Sign in and check admin access
    Whoami,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Show,
    SetUrl { url: String },
    SetKey { key: String },
    /// Forget the stored API key
    ClearKey,
    SetEmail { email: String },
}

#[derive(Subcommand, Debug)]
enum ProductCommand {
    /// Add a product, optionally with an image
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Delete a product and its image
    Delete { id: String },
    /// Change one field (title, description, price, category)
    Set { id: String, field: String, value: String },
}

/// Stderr output follows `--tracing`; the log file always gets INFO and up.
fn setup_tracing(enable: bool) -> Option<WorkerGuard> {
    let stderr_level = if enable { Level::TRACE } else { Level::WARN };
    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::from_level(stderr_level));

    let log_file = PathManager::log_file_path().filter(|_| PathManager::ensure_dirs_exist().is_ok());
    let (file, guard) = match log_file.as_deref().and_then(|path| Some((path.parent()?, path.file_name()?))) {
        Some((dir, name)) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(LevelFilter::INFO);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    if tracing_subscriber::registry().with(stderr).with(file).try_init().is_err() {
        eprintln!("Setting default subscriber failed");
    }
    guard
}

fn layout(settings: &Settings) -> StoreLayout {
    StoreLayout {
        bucket: settings.bucket.clone(),
        content_table: settings.content_table.clone(),
        products_table: settings.products_table.clone(),
        profiles_table: settings.profiles_table.clone(),
    }
}

fn policy(settings: &Settings, keep_old: bool) -> ReplacePolicy {
    ReplacePolicy {
        cleanup_old_asset: settings.upload.cleanup_old_asset && !keep_old,
        compensate_orphaned_upload: settings.upload.compensate_orphaned_upload,
        serialize_per_key: settings.upload.serialize_per_key,
    }
}

/// A signed-in administrator session on the hosted project
struct Admin {
    project: SupabaseProject,
    layout: StoreLayout,
    policy: ReplacePolicy,
    gate: Arc<AdminGate<atelier_supabase::PostgrestStore>>,
}

impl Admin {
    async fn sign_in(args: &Args, settings: &Settings) -> anyhow::Result<Self> {
        let url = args
            .url
            .clone()
            .or_else(|| settings.project_url.clone())
            .context("no project URL; pass --url or run `atelier config set-url`")?;
        let key = args
            .key
            .clone()
            .or_else(|| settings.get_api_key())
            .context("no API key; pass --key or run `atelier config set-key`")?;
        let email = args
            .email
            .clone()
            .or_else(|| settings.user_email.clone())
            .context("no administrator email; pass --email or run `atelier config set-email`")?;
        let Some(password) = args.password.as_deref() else {
            bail!("no password; set ATELIER_PASSWORD or pass --password");
        };

        let project = SupabaseProject::connect(&url, &key)?;
        project.auth.sign_in_with_password(&email, password).await?;

        let layout = layout(settings);
        let gate = Arc::new(AdminGate::new(
            project.auth.clone(),
            project.rows.clone(),
            layout.profiles_table.clone(),
        ));
        Ok(Self {
            project,
            layout,
            policy: policy(settings, args.keep_old),
            gate,
        })
    }

    fn replacer(&self) -> Arc<ImageReplacer<Supabase>> {
        Arc::new(
            ImageReplacer::<Supabase>::new(self.project.blobs.clone(), self.project.rows.clone(), self.layout.clone())
                .with_notifier(Arc::new(ConsoleNotifier))
                .with_policy(self.policy),
        )
    }

    fn catalog(&self) -> Catalog<Supabase> {
        Catalog::<Supabase>::new(self.project.blobs.clone(), self.project.rows.clone(), self.layout.clone())
            .with_policy(self.policy)
    }

    async fn replace(&self, target: ImageKey, file: &Path) -> anyhow::Result<()> {
        let image = read_image(file).await?;
        let slot = Arc::new(ConsoleSlot::new(target.to_string()));
        let handler = ImageDropHandler::new(self.replacer()).with_gate(self.gate.clone());

        let outcome = handler.handle(vec![image], target, slot).await?;
        println!("{}", outcome.url);
        match outcome.cleanup {
            CleanupStatus::Deleted(name) => eprintln!("removed previous image {}", name),
            CleanupStatus::Failed(err) => eprintln!("warning: {}", err),
            CleanupStatus::NothingToDelete | CleanupStatus::Disabled => {}
        }
        Ok(())
    }

    async fn sign_out(&self) {
        if let Err(err) = self.project.auth.sign_out().await {
            tracing::debug!("sign out failed: {:#}", err);
        }
    }
}

fn run_config(command: &ConfigCommand, settings: &mut Settings) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show => {
            if let Some(path) = PathManager::settings_path() {
                println!("settings file: {}", path.display());
            }
            println!("project url:   {}", settings.project_url.as_deref().unwrap_or("(unset)"));
            println!("admin email:   {}", settings.user_email.as_deref().unwrap_or("(unset)"));
            println!("api key:       {}", if settings.has_api_key() { "(stored)" } else { "(unset)" });
            println!("bucket:        {}", settings.bucket);
            println!(
                "tables:        {}, {}, {}",
                settings.content_table, settings.products_table, settings.profiles_table
            );
            println!("upload:        {:?}", settings.upload);
            return Ok(());
        }
        ConfigCommand::SetUrl { url } => settings.project_url = Some(url.trim_end_matches('/').to_string()),
        ConfigCommand::SetKey { key } => settings.set_api_key(key).map_err(anyhow::Error::msg)?,
        ConfigCommand::ClearKey => settings.clear_api_key(),
        ConfigCommand::SetEmail { email } => settings.user_email = Some(email.clone()),
    }
    settings.save().map_err(anyhow::Error::msg)?;
    println!("settings saved");
    Ok(())
}

async fn compress(input: &Path, output: &Path) -> anyhow::Result<()> {
    let image = read_image(input).await?;
    let transcoded = WebpTranscoder::new().compress(&image).await?;
    tokio::fs::write(output, &transcoded.bytes)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    println!(
        "{} -> {} ({}x{}, {} -> {} bytes)",
        input.display(),
        output.display(),
        transcoded.width,
        transcoded.height,
        image.size_bytes(),
        transcoded.bytes.len()
    );
    Ok(())
}

async fn run_admin(admin: &Admin, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::Slot { key, file } => admin.replace(ImageKey::slot(key.as_str()), file).await,
        Command::ProductImage { id, file } => admin.replace(ImageKey::product(id.as_str()), file).await,
        Command::Content { key, text } => {
            admin.gate.authorize().await?;
            admin
                .catalog()
                .save_content(&SlotKey::from_string(key.as_str()), text)
                .await?;
            println!("saved {}", key);
            Ok(())
        }
        Command::Product(product) => {
            admin.gate.authorize().await?;
            run_product(&admin.catalog(), product).await
        }
        Command::Whoami => {
            let user = admin.gate.authorize().await?;
            println!("{} ({}) is an administrator", user.email.unwrap_or_default(), user.id);
            Ok(())
        }
        Command::Config(_) | Command::Compress { .. } => Ok(()),
    }
}

async fn run_product(catalog: &Catalog<Supabase>, command: &ProductCommand) -> anyhow::Result<()> {
    match command {
        ProductCommand::Create {
            title,
            price,
            description,
            category,
            image,
        } => {
            let image = match image {
                Some(path) => Some(read_image(path).await?),
                None => None,
            };
            let product = NewProduct {
                title: title.clone(),
                description: description.clone(),
                price: parse_price(price)?,
                category: category.clone(),
            };
            let created = catalog.create_product(product, image).await?;
            println!("created product {}", created.id);
        }
        ProductCommand::Delete { id } => {
            catalog.delete_product(&ProductId::from_string(id.as_str())).await?;
            println!("deleted product {}", id);
        }
        ProductCommand::Set { id, field, value } => {
            let field = ProductField::parse(field)?;
            catalog
                .update_product_field(&ProductId::from_string(id.as_str()), field, value)
                .await?;
            println!("updated {} of product {}", field.column(), id);
        }
    }
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut settings = Settings::load();

    match &args.command {
        Command::Config(command) => run_config(command, &mut settings),
        Command::Compress { input, output } => compress(input, output).await,
        command => {
            let admin = Admin::sign_in(&args, &settings).await?;
            let result = run_admin(&admin, command).await;
            admin.sign_out().await;
            result
        }
    }
}

#[tokio::main]
async fn main() {
    load_env_file();
    let args = Args::parse();
    let _guard = setup_tracing(args.tracing);

    if let Err(err) = run(args).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slot_command() {
        let args = Args::try_parse_from(["atelier", "slot", "home_hero_image", "hero.jpg", "--keep-old"]).unwrap();
        assert!(args.keep_old);
        match args.command {
            Command::Slot { key, file } => {
                assert_eq!(key, "home_hero_image");
                assert_eq!(file, PathBuf::from("hero.jpg"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_product_create() {
        let args = Args::try_parse_from([
            "atelier", "product", "create", "--title", "Bergère", "--price", "450 €", "--image", "b.png",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Product(ProductCommand::Create { ref title, image: Some(_), .. }) if title == "Bergère"
        ));
    }

    #[test]
    fn test_parse_config_clear_key() {
        let args = Args::try_parse_from(["atelier", "config", "clear-key"]).unwrap();
        assert!(matches!(args.command, Command::Config(ConfigCommand::ClearKey)));
    }

    #[test]
    fn test_keep_old_disables_cleanup() {
        let settings = Settings::default();
        assert!(policy(&settings, false).cleanup_old_asset);
        assert!(!policy(&settings, true).cleanup_old_asset);
        assert_eq!(layout(&settings), StoreLayout::default());
    }
}
