use std::path::PathBuf;

use clap::{Args, Subcommand};
use models::PaymentMethod;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "ACARA_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// List published events, or show one
    Events { id: Option<u64> },

    /// Pay for an event registration or the organizer upgrade
    Pay(PayArgs),

    /// Show a payment and keep checking while it is pending
    Status {
        invoice: String,

        #[arg(long)]
        no_watch: bool,
    },

    /// List your certificates
    Certificates,

    /// Save a certificate as PDF
    Download {
        id: u64,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    #[command(subcommand)]
    Password(PasswordCommand),

    #[command(subcommand)]
    Profile(ProfileCommand),

    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
pub struct PayArgs {
    /// Event to register for
    #[arg(long, conflicts_with = "upgrade", required_unless_present = "upgrade")]
    pub event: Option<u64>,

    /// Upgrade this account to event organizer
    #[arg(long)]
    pub upgrade: bool,

    /// bank_transfer, ewallet or qris
    #[arg(long)]
    pub method: Option<PaymentMethod>,

    #[arg(long)]
    pub channel: Option<String>,

    /// Confirm the payment right away (developer mode only)
    #[arg(long)]
    pub simulate: bool,

    #[arg(long)]
    pub no_watch: bool,
}

#[derive(Subcommand, Debug)]
pub enum PasswordCommand {
    Change {
        #[arg(long)]
        current: String,

        #[arg(long)]
        new: String,

        #[arg(long)]
        confirm: String,
    },

    /// Request a reset link by email
    Forgot {
        #[arg(long)]
        email: String,
    },

    Reset {
        #[arg(long)]
        token: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        new: String,

        #[arg(long)]
        confirm: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Change name and phone, leaving out a flag keeps the current value
    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },

    /// Upload a PNG, JPG or WEBP profile picture
    Picture { path: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Every payment on the platform
    Payments,
}
