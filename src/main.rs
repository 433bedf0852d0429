use clap::Parser;
use cardlog::cli::commands;
use cardlog::cli::{init_logging, output, AuthAction, Cli, Commands, Context, SetsAction};
use cardlog::errors::Result;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        output::error(&e.to_string());
        if e.is_fatal() {
            output::tip("The collection file is damaged. Restore it from a backup.");
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Completions need no config or collection.
    if let Commands::Completions { shell } = cli.command {
        return commands::completions::execute(shell);
    }

    let ctx = Context::load(cli)?;

    match cli.command {
        Commands::Init => commands::init::execute(&ctx),
        Commands::Add {
            ref card_id,
            print_type,
            qty,
        } => commands::add::execute(&ctx, card_id, print_type, qty),
        Commands::Remove {
            ref card_id,
            print_type,
            qty,
        } => commands::remove::execute(&ctx, card_id, print_type, qty),
        Commands::Delete {
            ref card_id,
            print_type,
            force,
        } => commands::delete::execute(&ctx, card_id, print_type, force),
        Commands::Show {
            ref card_id,
            print_type,
        } => commands::show::execute(&ctx, card_id, print_type),
        Commands::List => commands::list::execute(&ctx),
        Commands::Logins => commands::logins::execute(&ctx),
        Commands::Trade {
            ref with,
            ref give,
            ref take,
            yes,
        } => commands::trade::execute(&ctx, with, give, take, yes),
        Commands::Import { ref file } => commands::import_cmd::execute(&ctx, file),
        Commands::Export { ref output, prices } => {
            commands::export::execute(&ctx, output.as_deref(), prices)
        }
        Commands::Value => commands::value::execute(&ctx),
        Commands::Price { ref card_id } => commands::price::execute(&ctx, card_id),
        Commands::Sets { ref action } => match action {
            SetsAction::List => commands::sets::execute_list(&ctx),
            SetsAction::Show { set_id } => commands::sets::execute_show(&ctx, set_id),
        },
        Commands::Status => commands::status::execute(&ctx),
        Commands::Collections => commands::collections::execute(&ctx),
        Commands::Audit {
            last,
            ref since,
            all,
        } => audit(&ctx, last, since.as_deref(), all),
        Commands::Auth { ref action } => match action {
            AuthAction::Keyring { delete } => commands::auth::execute_keyring(&ctx, *delete),
        },
        Commands::Completions { .. } => Ok(()),
    }
}

#[cfg(feature = "audit-log")]
fn audit(ctx: &Context, last: usize, since: Option<&str>, all: bool) -> Result<()> {
    commands::audit_cmd::execute(ctx, last, since, all)
}

#[cfg(not(feature = "audit-log"))]
fn audit(_ctx: &Context, _last: usize, _since: Option<&str>, _all: bool) -> Result<()> {
    Err(cardlog::errors::CardLogError::AuditError(
        "audit log not compiled — rebuild with the `audit-log` feature".into(),
    ))
}
