use clap::Parser;

use finboard::cli::{
    self, CategoriesCommands, Cli, ClustersCommands, Commands, IbanCommands, OverrideCommands,
    ReportCommands, Workspace,
};
use finboard::logging;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let ws = Workspace::resolve(cli.data_dir.as_deref(), cli.rules.as_deref());

    let result = match cli.command {
        Commands::Init => cli::init::run(&ws),
        Commands::Status => cli::status::run(&ws),
        Commands::Transactions {
            year,
            account,
            category,
            limit,
        } => cli::transactions::run(&ws, &year, account, category, limit),
        Commands::Report { command, year } => match command {
            ReportCommands::Summary => cli::report::summary(&ws, &year),
            ReportCommands::Categories => cli::report::categories(&ws, &year),
            ReportCommands::Cashflow => cli::report::cashflow(&ws, &year),
            ReportCommands::Compare { first, second } => cli::report::compare(&ws, first, second),
            ReportCommands::Typical => cli::report::typical(&ws, &year),
            ReportCommands::Clusters { category, limit } => {
                cli::report::clusters(&ws, &year, category, limit)
            }
            ReportCommands::Trends { raw, top, monthly } => {
                cli::report::trends(&ws, &year, !raw, top, monthly)
            }
            ReportCommands::Investments => cli::report::investments(&ws, &year),
        },
        Commands::Categories { command } => match command {
            CategoriesCommands::List => cli::categories::list(&ws),
            CategoriesCommands::Add { name } => cli::categories::add(&ws, &name),
            CategoriesCommands::Keywords { name, keywords } => {
                cli::categories::keywords(&ws, &name, &keywords)
            }
            CategoriesCommands::Rename { old, new } => cli::categories::rename(&ws, &old, &new),
            CategoriesCommands::Delete { name } => cli::categories::delete(&ws, &name),
        },
        Commands::Clusters { command } => match command {
            ClustersCommands::List => cli::clusters::list(&ws),
            ClustersCommands::Add { label, patterns } => cli::clusters::add(&ws, &label, &patterns),
            ClustersCommands::Patterns { label, patterns } => {
                cli::clusters::patterns(&ws, &label, &patterns)
            }
            ClustersCommands::Rename { old, new } => cli::clusters::rename(&ws, &old, &new),
            ClustersCommands::Delete { label } => cli::clusters::delete(&ws, &label),
        },
        Commands::Iban { command } => match command {
            IbanCommands::List => cli::iban::list(&ws),
            IbanCommands::Add { iban, category } => cli::iban::add(&ws, &iban, &category),
            IbanCommands::Delete { iban } => cli::iban::delete(&ws, &iban),
        },
        Commands::Override { command } => match command {
            OverrideCommands::Set { target, category } => {
                cli::overrides::set(&ws, &target, &category)
            }
            OverrideCommands::List => cli::overrides::list(&ws),
            OverrideCommands::Clear => cli::overrides::clear(&ws),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
