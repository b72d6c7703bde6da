//! # Acara Console
//!
//! Terminal front end for the Acara portal. Every command goes through the same service
//! adapters and flows a graphical client would use.
//!
//! ## Session
//!
//! `login` stores the bearer token and user in `ACARA_SESSION_FILE`. Any later command
//! that gets a 401 back removes that file again.
//!
//! ## Payments
//!
//! `pay` runs the checkout flow:
//! 1. Method and channel are taken from `--method` and `--channel`. QRIS has a single
//!    channel and needs no `--channel`.
//! 2. Without a valid pair the flow stays on the first step and the available
//!    channels are listed.
//! 3. The payment is created, optionally confirmed with `--simulate` when
//!    `ACARA_DEV_MODE` is on, and then watched like `status`.
//!
//! `status` polls every `ACARA_POLL_INTERVAL_SECS` while the payment is pending and stops
//! on the first final status. Ctrl+C stops watching without touching the payment.
//!
//! ## Notes
//! - Server messages are printed unchanged
//! - Nothing is retried, except the next poll while watching a payment
use std::{path::Path, sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use api::{Config, FileTokenStore, HttpClient, Services, Session};
use flows::{
    ChangePasswordForm, CheckoutFlow, FormErrors, ForgotPasswordForm, PaymentPoller, PollConfig,
    ProfileForm, Purpose, ResetPasswordForm, Submission,
};
use indicatif::{ProgressBar, ProgressStyle};
use models::PaymentMethod;
use tokio::{fs, signal::ctrl_c};
use tracing::{debug, info};

pub mod cli;
pub mod render;

use cli::{AdminCommand, Command, PasswordCommand, PayArgs, ProfileCommand};

pub async fn run(command: Command) -> Result<()> {
    let config = Config::load()?;
    info!("Using API at {}", config.api_url);

    let store = Arc::new(FileTokenStore::new(&config.session_file));
    let session = Session::restore(store)?;
    let services = Services::new(HttpClient::new(config.clone(), session.clone())?);

    match command {
        Command::Login { email, password } => {
            let user = services.auth.login(&email, &password).await?;
            println!("Masuk sebagai {}", render::user_line(&user));
        }
        Command::Logout => {
            services.auth.logout()?;
            println!("Anda telah keluar");
        }
        Command::Whoami => {
            let user = services.auth.me().await?;
            println!("{}", render::user_line(&user));
        }
        Command::Events { id: Some(id) } => {
            let event = services.events.get(id).await?;
            println!("{}", render::event_line(&event));

            if let Some(description) = &event.description {
                println!("\n{description}");
            }
        }
        Command::Events { id: None } => {
            let events = services.events.list().await?;

            for event in &events {
                println!("{}", render::event_line(event));
            }
            println!("\nTotal Events: {}", events.len());
        }
        Command::Pay(args) => pay(&services, &config, args).await?,
        Command::Status { invoice, no_watch } => {
            watch(&services, &config, &invoice, !no_watch).await?
        }
        Command::Certificates => {
            let certificates = services.certificates.list().await?;

            if certificates.is_empty() {
                println!("Belum ada sertifikat");
            }
            for certificate in &certificates {
                println!("{}", render::certificate_line(certificate));
            }
        }
        Command::Download { id, out } => {
            let certificates = services.certificates.list().await?;
            let certificate = certificates
                .iter()
                .find(|certificate| certificate.id == id)
                .ok_or_else(|| anyhow!("Sertifikat #{id} tidak ditemukan"))?;

            let pdf = services.certificates.download(certificate).await?;
            let path = out.unwrap_or_else(|| certificate.file_name().into());

            fs::write(&path, &pdf)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Tersimpan di {} ({} bytes)", path.display(), pdf.len());
        }
        Command::Password(command) => password(&services, command).await?,
        Command::Profile(command) => profile(&services, &session, &config, command).await?,
        Command::Admin(AdminCommand::Payments) => {
            let payments = services.payments.admin_list().await?;

            for payment in &payments {
                println!("{}", render::payment_line(payment));
            }
            println!("\nTotal Payments: {}", payments.len());
        }
    }

    Ok(())
}

async fn pay(services: &Services, config: &Config, args: PayArgs) -> Result<()> {
    let purpose = match args.event {
        Some(event_id) => {
            let event = services.events.get(event_id).await?;
            println!("{}", render::event_line(&event));

            Purpose::EventRegistration { event_id }
        }
        None => {
            println!("Upgrade akun menjadi penyelenggara event");
            Purpose::OrganizerUpgrade
        }
    };

    let mut flow = CheckoutFlow::new(purpose).with_dev_mode(config.dev_mode);

    if let Some(method) = args.method {
        flow.select_method(method)?;
    }
    if let Some(channel) = &args.channel {
        flow.select_channel(channel)?;
    }

    if let Err(e) = flow.next() {
        println!("Metode pembayaran:");
        for method in PaymentMethod::ALL {
            println!("  {} ({method}): {}", method.label(), method.channels().join(", "));
        }

        return Err(e.into());
    }

    let payment = flow.submit(&services.payments).await?;
    println!("{}", render::payment_line(payment));
    let invoice = payment.invoice_number.clone();

    if args.simulate {
        let paid = flow.simulate_success(&services.payments).await?;
        println!("{}", render::payment_line(paid));
    }

    watch(services, config, &invoice, !args.no_watch).await
}

async fn watch(services: &Services, config: &Config, invoice: &str, follow: bool) -> Result<()> {
    let poll = PollConfig {
        auto_refresh: follow,
        ..PollConfig::from(config)
    };
    let poller = PaymentPoller::start(Arc::new(services.payments.clone()), invoice, poll);
    let mut snapshots = poller.subscribe();

    if !follow {
        let snapshot = snapshots.wait_for(|snapshot| snapshot.fetches > 0).await?.clone();
        if let Some(error) = snapshot.error {
            bail!(error);
        }

        println!("{}", render::snapshot_line(&snapshot));
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {msg}",
    )?);
    spinner.enable_steady_tick(Duration::from_millis(120));

    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        spinner.set_message(render::snapshot_line(&snapshot));

        if snapshot.is_terminal() {
            spinner.finish_with_message(render::snapshot_line(&snapshot));
            break;
        }

        // Without a known status there is nothing to keep polling.
        if snapshot.fetches > 0 && snapshot.payment.is_none() {
            spinner.abandon();
            bail!(snapshot.error.unwrap_or_else(|| api::error::FALLBACK_MESSAGE.to_string()));
        }

        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = ctrl_c() => {
                debug!("Stopped watching {invoice}");
                poller.stop();
                spinner.abandon_with_message("Pemantauan dihentikan");
                break;
            }
        }
    }

    Ok(())
}

async fn password(services: &Services, command: PasswordCommand) -> Result<()> {
    match command {
        PasswordCommand::Change {
            current,
            new,
            confirm,
        } => {
            let mut form = ChangePasswordForm {
                current_password: current,
                new_password: new,
                confirmation: confirm,
                ..ChangePasswordForm::default()
            };

            if let Err(errors) = form.validate() {
                print_checklist(&form.checklist());
                return Err(reject(errors));
            }

            form.submit(&services.auth).await;
            report(&form.submission)
        }
        PasswordCommand::Forgot { email } => {
            let mut form = ForgotPasswordForm {
                email,
                ..ForgotPasswordForm::default()
            };
            form.validate().map_err(reject)?;

            form.submit(&services.auth).await;
            report(&form.submission)
        }
        PasswordCommand::Reset {
            token,
            email,
            new,
            confirm,
        } => {
            let mut form = ResetPasswordForm::new(token, email);
            form.password = new;
            form.confirmation = confirm;

            if let Err(errors) = form.validate() {
                print_checklist(&form.checklist());
                return Err(reject(errors));
            }

            form.submit(&services.auth).await;
            report(&form.submission)
        }
    }
}

async fn profile(
    services: &Services,
    session: &Session,
    config: &Config,
    command: ProfileCommand,
) -> Result<()> {
    let user = match session.user() {
        Some(user) => user,
        None => services.auth.me().await?,
    };
    let mut form = ProfileForm::from_user(&user);

    match command {
        ProfileCommand::Update { name, phone } => {
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(phone) = phone {
                form.phone = phone;
            }
            form.validate().map_err(reject)?;

            if let Some(user) = form.submit(&services.auth).await {
                println!("{}", render::user_line(&user));
            }
            report(&form.submission)
        }
        ProfileCommand::Picture { path } => {
            let mime = render::picture_mime(&path)
                .ok_or_else(|| anyhow!("Format foto harus PNG, JPG, atau WEBP"))?;
            let bytes = fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;

            #[cfg(feature = "verbose")]
            println!("Uploading {} bytes as {mime}", bytes.len());

            let file_name = file_name(&path);
            if let Some(user) = form
                .upload_picture(&services.auth, &file_name, bytes, mime)
                .await
            {
                if let Some(picture) = &user.profile_picture {
                    println!("{}", config.asset_url(picture));
                }
            }
            report(&form.submission)
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("picture")
        .to_string()
}

fn print_checklist(checklist: &flows::PasswordChecklist) {
    for line in render::checklist_lines(checklist) {
        println!("{line}");
    }
}

fn reject(errors: FormErrors) -> anyhow::Error {
    for error in errors.iter().skip(1) {
        println!("{}: {}", error.field, error.message);
    }

    anyhow!(errors)
}

fn report(submission: &Submission) -> Result<()> {
    match submission.state() {
        flows::FormState::Succeeded(message) => {
            println!("{message}");
            Ok(())
        }
        flows::FormState::Failed(message) => bail!(message.clone()),
        _ => Ok(()),
    }
}
