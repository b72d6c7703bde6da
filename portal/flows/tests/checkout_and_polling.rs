use std::{sync::Arc, time::Duration};

use api::{Config, HttpClient, Services, Session};
use flows::{
    ChangePasswordForm, CheckoutFlow, CheckoutStep, FormState, PaymentPoller, PollConfig,
    ProfileForm, Purpose,
};
use models::{PaymentMethod, PaymentStatus, Role};
use tokio::time::timeout;

async fn signed_in(dev_mode: bool) -> Services {
    let url = sandbox::spawn_local(sandbox::config::Config::default())
        .await
        .unwrap();
    let config = Config::new(&url).unwrap().with_dev_mode(dev_mode);
    let services = Services::new(HttpClient::new(config, Session::in_memory()).unwrap());

    services
        .auth
        .login("budi@acara.test", "Peserta123!")
        .await
        .unwrap();
    services
}

fn fast() -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(50),
        auto_refresh: true,
    }
}

#[tokio::test]
async fn test_registration_checkout_until_paid() {
    let services = signed_in(true).await;

    let mut flow = CheckoutFlow::new(Purpose::EventRegistration { event_id: 1 }).with_dev_mode(true);
    assert!(flow.next().is_err());

    flow.select_method(PaymentMethod::BankTransfer).unwrap();
    flow.select_channel("mandiri").unwrap();
    flow.next().unwrap();

    let invoice = flow
        .submit(&services.payments)
        .await
        .unwrap()
        .invoice_number
        .clone();
    assert_eq!(flow.step_index(), 2);

    let poller = PaymentPoller::start(Arc::new(services.payments.clone()), invoice.clone(), fast());
    let mut snapshots = poller.subscribe();
    snapshots.wait_for(|snapshot| snapshot.fetches >= 1).await.unwrap();
    assert_eq!(poller.snapshot().status(), Some(PaymentStatus::Pending));

    flow.simulate_success(&services.payments).await.unwrap();

    let paid = timeout(Duration::from_secs(5), poller.settled())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(paid.invoice_number, invoice);
    assert_eq!(paid.status, PaymentStatus::Success);
    assert_eq!(
        poller.snapshot().presentation().unwrap().label,
        "Pembayaran Berhasil!"
    );
    assert!(!poller.refresh());
}

#[tokio::test]
async fn test_checkout_failure_keeps_confirm() {
    let services = signed_in(false).await;

    let mut flow = CheckoutFlow::new(Purpose::EventRegistration { event_id: 3 });
    flow.select_method(PaymentMethod::Qris).unwrap();
    flow.next().unwrap();

    assert!(flow.submit(&services.payments).await.is_err());
    assert_eq!(flow.step(), &CheckoutStep::Confirm);
    assert_eq!(flow.error(), Some("Event ini gratis, tidak perlu pembayaran"));
}

#[tokio::test]
async fn test_upgrade_checkout() {
    let services = signed_in(true).await;

    let mut flow = CheckoutFlow::new(Purpose::OrganizerUpgrade).with_dev_mode(true);
    flow.select_method(PaymentMethod::EWallet).unwrap();
    flow.select_channel("gopay").unwrap();
    flow.next().unwrap();
    flow.submit(&services.payments).await.unwrap();
    flow.simulate_success(&services.payments).await.unwrap();

    assert_eq!(services.auth.me().await.unwrap().role, Role::EventOrganizer);
}

#[tokio::test]
async fn test_forms_against_backend() {
    let services = signed_in(false).await;

    let mut form = ChangePasswordForm {
        current_password: "Salah123!".to_string(),
        new_password: "Abcdef1!".to_string(),
        confirmation: "Abcdef1!".to_string(),
        ..ChangePasswordForm::default()
    };
    assert!(!form.submit(&services.auth).await);
    assert_eq!(
        form.submission.state(),
        &FormState::Failed("Password saat ini salah".to_string())
    );

    form.current_password = "Peserta123!".to_string();
    assert!(form.submit(&services.auth).await);
    assert!(form.new_password.is_empty());

    let user = services.auth.me().await.unwrap();
    let mut profile = ProfileForm::from_user(&user);
    profile.name = "Budi Santoso, S.Kom".to_string();

    let updated = profile.submit(&services.auth).await.unwrap();
    assert_eq!(updated.name, "Budi Santoso, S.Kom");
    assert_eq!(
        services.auth.me().await.unwrap().name,
        "Budi Santoso, S.Kom"
    );
}
