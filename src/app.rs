use crate::cli::Args;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::TryStreamExt;
use mailport_config::{AuthConfig, Config, Dirs};
use mailport_executor::{Executor, ReauthGate};
use mailport_ledger::{Database, scope};
use mailport_naming::{LabelMapper, Overrides};
use mailport_pipeline::{Context, Migration, MigrationEvent};
use mailport_remote::gmail::GmailApi;
use mailport_remote::{AuthProvider, CommandToken, Session, StaticToken};
use mailport_spool::Exclusions;
use mailport_spool::backend::LocalSpool;
use std::path::Path;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub async fn run(args: Args) -> Result<()> {
    let dirs = Dirs::discover().or_raise(|| ErrorKind::Config)?;
    let mut config = Config::load_from(&dirs, args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
        config.validate().or_raise(|| ErrorKind::Config)?;
    }
    let key = args.key.clone().unwrap_or_else(|| Config::default_key_path(&dirs));

    let mut rules = Exclusions::new(config.ignore_dirs.iter().cloned(), &config.ignore_files, config.max_item_size)
        .or_raise(|| ErrorKind::Config)?;
    if args.include_trash {
        rules = rules.without_dir("Trash");
    }
    if args.include_drafts {
        rules = rules.without_dir("Drafts");
    }
    let root = std::path::absolute(&args.root).or_raise(|| ErrorKind::Spool)?;
    let spool = LocalSpool::new(&root).or_raise(|| ErrorKind::Spool)?;

    let overrides = Overrides::new(&config.labels).or_raise(|| ErrorKind::Naming)?;
    let mapper = LabelMapper::new(overrides)
        .with_flatten(args.flatten)
        .with_subfolder(args.subfolder.as_deref())
        .or_raise(|| ErrorKind::Naming)?;

    let session = Arc::new(Session::new(provider(&config.auth, &args, &key)?));
    let remote = GmailApi::new(session.clone(), REQUEST_TIMEOUT).or_raise(|| ErrorKind::Remote)?;
    let executor = Executor::new(config.concurrency)
        .or_raise(|| ErrorKind::Config)?
        .with_policy(config.retry.policy())
        .with_reauth(Arc::new(ReauthGate::new(session.clone())));

    let db = Database::open(config.ledger_path(&dirs)).await.or_raise(|| ErrorKind::Ledger)?;
    let ledger = db.ledger(scope(&args.account, mapper.subfolder()));

    info!(
        root = %root.display(),
        account = %args.account,
        scope = ledger.scope(),
        concurrency = config.concurrency,
        "starting import"
    );
    let ctx = Context::new(&args.account, Arc::new(spool), Arc::new(remote), Arc::new(ledger), executor)
        .with_mapper(mapper)
        .with_rules(rules)
        .with_keys(config.dedup_key);
    let migration = Migration::new(ctx).with_session(session);

    let result = report(&migration).await;
    db.close().await;
    result
}

fn provider(auth: &AuthConfig, args: &Args, key: &Path) -> Result<Arc<dyn AuthProvider>> {
    if let Some(token) = &auth.access_token {
        return Ok(Arc::new(StaticToken::new(token.clone())));
    }
    let Some(command) = &auth.token_command else {
        exn::bail!(ErrorKind::NoCredentials);
    };
    if !key.is_file() {
        warn!(path = %key.display(), "service account key not found");
    }
    Ok(Arc::new(
        CommandToken::new(command)
            .with_env("MAILPORT_SERVICE_ACCOUNT", &args.service_account)
            .with_env("MAILPORT_KEY_FILE", key.display().to_string())
            .with_env("MAILPORT_ACCOUNT", &args.account),
    ))
}

async fn report(migration: &Migration) -> Result<()> {
    let mut events = pin!(migration.run());
    while let Some(event) = events.try_next().await.or_raise(|| ErrorKind::Import)? {
        match event {
            MigrationEvent::Authorized => info!("authorized"),
            MigrationEvent::LabelsResolved(resolution) => {
                for entry in &resolution.folders {
                    debug!(folder = %entry.folder, label = %entry.label, "folder");
                }
                info!(
                    folders = resolution.folders.len(),
                    labels = resolution.table.len(),
                    created = resolution.created.len(),
                    "labels ready"
                );
            },
            MigrationEvent::Imported { sent, .. } => {
                debug!(key = %sent.key, label = %sent.output.label, attempts = sent.attempts, "imported");
            },
            MigrationEvent::Complete(summary) => {
                info!(
                    migrated = summary.migrated,
                    skipped = summary.skipped,
                    elapsed = ?summary.elapsed,
                    "import finished"
                );
            },
        }
    }
    Ok(())
}
