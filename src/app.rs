use std::{io, sync::Arc, time::Duration};

use anyhow::Result;

use crate::{
    cli::{Cli, Command},
    domain::{self, conversation::SessionId},
    infra::{
        self,
        console::{ConsoleSink, ConsoleSource},
        error::AppError,
        instance_lock::InstanceLock,
        storage_layout::instance_lock_file,
    },
    telegram::{
        self,
        bot_api::BotApiClient,
        transport::{TelegramReplies, TelegramUpdates},
    },
    usecases::{
        self, bootstrap,
        context::AppContext,
        relay::{run_relay, RelayOptions},
    },
};

const BOT_STARTED: &str = "BOT_STARTED";
const CONSOLE_STARTED: &str = "CONSOLE_STARTED";

pub fn run(cli: Cli) -> Result<()> {
    let context = bootstrap::bootstrap(cli.config.as_deref())?;

    tracing::debug!(
        domain = domain::module_name(),
        telegram = telegram::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    match cli.command_or_default() {
        Command::Run => run_bot(&context),
        Command::Console { session } => run_console(&context, SessionId(session)),
    }
}

fn run_bot(context: &AppContext) -> Result<()> {
    let bot = &context.config.bot;
    if bot.token.trim().is_empty() {
        return Err(AppError::MissingBotToken.into());
    }

    let _lock = InstanceLock::acquire(&instance_lock_file(&context.database_path))?;

    let api = Arc::new(BotApiClient::new(
        &bot.api_base_url,
        bot.token.trim(),
        bot.poll_timeout_secs,
    )?);
    let mut updates = TelegramUpdates::new(Arc::clone(&api));
    let replies = TelegramReplies::new(api);

    tracing::info!(
        code = BOT_STARTED,
        database = %context.database_path.display(),
        poll_timeout_secs = bot.poll_timeout_secs,
        "bot started, polling for updates"
    );

    run_relay(
        &context.dispatcher,
        &mut updates,
        &replies,
        &relay_options(context),
    )?;
    Ok(())
}

fn run_console(context: &AppContext, session: SessionId) -> Result<()> {
    let stdin = io::stdin();
    let mut source = ConsoleSource::new(stdin.lock(), session);
    let sink = ConsoleSink::new(io::stdout());

    tracing::info!(code = CONSOLE_STARTED, session = %session, "console session started");
    println!("Type /start to begin. End input (Ctrl-D) to quit.");

    let stats = run_relay(
        &context.dispatcher,
        &mut source,
        &sink,
        &relay_options(context),
    )?;
    tracing::debug!(messages = stats.messages, "console session finished");
    Ok(())
}

fn relay_options(context: &AppContext) -> RelayOptions {
    RelayOptions {
        error_backoff: Duration::from_millis(context.config.bot.error_backoff_ms),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::infra::config::AppConfig;

    fn context_in(dir: &Path, token: &str) -> AppContext {
        let mut config = AppConfig::default();
        config.storage.database = Some(dir.join("shifts.sqlite"));
        config.bot.token = token.to_owned();
        bootstrap::build_context(config).expect("context should build")
    }

    #[test]
    fn bot_refuses_to_start_without_token() {
        let dir = tempfile::tempdir().expect("temp dir");
        let context = context_in(dir.path(), "   ");

        let error = run_bot(&context).expect_err("missing token must fail");

        assert!(matches!(
            error.downcast_ref::<AppError>(),
            Some(AppError::MissingBotToken)
        ));
    }

    #[test]
    fn second_bot_instance_is_rejected_while_lock_is_held() {
        let dir = tempfile::tempdir().expect("temp dir");
        let context = context_in(dir.path(), "123456:test-token");
        let _held = InstanceLock::acquire(&instance_lock_file(&context.database_path))
            .expect("first lock");

        let error = run_bot(&context).expect_err("locked instance must fail");

        assert!(matches!(
            error.downcast_ref::<AppError>(),
            Some(AppError::InstanceLocked { .. })
        ));
    }

    #[test]
    fn relay_backoff_follows_bot_config() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut context = context_in(dir.path(), "");
        context.config.bot.error_backoff_ms = 250;

        assert_eq!(
            relay_options(&context).error_backoff,
            Duration::from_millis(250)
        );
    }
}
