// Directory access predicate and payout channel parsing

use std::str::FromStr;

use chrono::Utc;
use revly_backend_core::models::user::{can_manage, PaymentPreference, User};
use uuid::Uuid;

fn user(company_id: Uuid, is_admin: bool, is_super_admin: bool) -> User {
    User {
        id: Uuid::new_v4(),
        company_id,
        email: "user@example.com".to_string(),
        password_hash: "hash".to_string(),
        name: "User".to_string(),
        phone_number: None,
        convomat_user_id: None,
        amazon_id: None,
        payment_preference: None,
        is_admin,
        is_super_admin,
        is_active: true,
        is_banned: false,
        is_vip: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn same_tenant_customer_is_manageable() {
    let company = Uuid::new_v4();
    let actor = user(company, true, false);
    let target = user(company, false, false);

    assert!(can_manage(&actor, &target));
}

#[tokio::test]
async fn admin_targets_are_denied() {
    let company = Uuid::new_v4();
    let actor = user(company, true, false);

    assert!(!can_manage(&actor, &user(company, true, false)));
    assert!(!can_manage(&actor, &user(company, false, true)));
}

#[tokio::test]
async fn cross_tenant_targets_are_denied() {
    let actor = user(Uuid::new_v4(), true, false);
    let target = user(Uuid::new_v4(), false, false);

    assert!(!can_manage(&actor, &target));
}

#[tokio::test]
async fn payment_preferences_parse_all_five_channels() {
    let channels = [
        ("venmo", PaymentPreference::Venmo),
        ("amazon_gift_card", PaymentPreference::AmazonGiftCard),
        ("visa_gift_card", PaymentPreference::VisaGiftCard),
        ("mastercard_gift_card", PaymentPreference::MastercardGiftCard),
        ("paypal", PaymentPreference::Paypal),
    ];

    for (raw, expected) in channels {
        assert_eq!(PaymentPreference::from_str(raw).unwrap(), expected);
        assert_eq!(expected.as_str(), raw);
    }
}

#[tokio::test]
async fn unknown_payment_preference_is_an_error() {
    // send_payout turns this into a 400 instead of silently skipping
    // the dispatch
    assert!(PaymentPreference::from_str("zelle").is_err());

    let mut customer = user(Uuid::new_v4(), false, false);
    customer.payment_preference = Some("zelle".to_string());
    assert!(customer.payment_preference_enum().is_err());

    customer.payment_preference = Some("paypal".to_string());
    assert_eq!(
        customer.payment_preference_enum().unwrap(),
        PaymentPreference::Paypal
    );
}

#[tokio::test]
async fn serialized_user_never_leaks_password_hash() {
    let target = user(Uuid::new_v4(), false, false);
    let encoded = serde_json::to_value(&target).unwrap();
    assert!(encoded.get("password_hash").is_none());
    assert_eq!(encoded["email"], "user@example.com");
}
