use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "portal-ibadah",
    version,
    author,
    about = "Prayer times, countdown and alarms for the terminal"
)]
pub struct Cli {
    /// Compute times locally instead of asking the myquran.com API
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the prayer table, the current prayer and the countdown to the next
    Times {
        /// Show another day (YYYY-MM-DD) instead of today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Live countdown; rings enabled alarms as each prayer arrives
    Watch {
        /// Wake only at prayer boundaries instead of every second
        #[arg(long)]
        precise: bool,
    },
    /// Per-prayer alarm switches
    Alarm {
        #[command(subcommand)]
        action: AlarmCommands,
    },
    /// Selected city
    City {
        #[command(subcommand)]
        action: CityCommands,
    },
    /// Show the notifications planned for today and tomorrow
    Notify,
}

#[derive(Subcommand, Debug)]
pub enum AlarmCommands {
    /// Show which alarms are on
    List,
    /// Turn an alarm on
    On {
        /// Prayer name (imsak, subuh, terbit, dzuhur, ashar, maghrib, isya)
        prayer: String,
    },
    /// Turn an alarm off
    Off {
        /// Prayer name
        prayer: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CityCommands {
    /// Show the selected city
    Show,
    /// Select a city by its myquran.com id
    Set {
        /// City id, as listed by `city search`
        id: String,
    },
    /// Look up city ids by name
    Search {
        /// Part of the city name, e.g. "bandung"
        keyword: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_commands() {
        let cli = Cli::try_parse_from(["portal-ibadah", "alarm", "on", "maghrib"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Alarm {
                action: AlarmCommands::On { ref prayer }
            }) if prayer == "maghrib"
        ));

        let cli = Cli::try_parse_from([
            "portal-ibadah",
            "times",
            "--date",
            "2026-10-20",
            "--offline",
        ])
        .unwrap();
        assert!(cli.offline);
        assert!(matches!(
            cli.command,
            Some(Commands::Times { date: Some(d) })
                if d == NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
        ));
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["portal-ibadah"]).unwrap();
        assert!(cli.command.is_none());
    }
}
