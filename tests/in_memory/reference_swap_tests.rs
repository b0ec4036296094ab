//! Replacing the route catalog while dispatch is running.

use haulier::config::ReferenceDataDocument;
use haulier::dispatch::{domain::DeliveryMethod, services::CreateDeliveryTaskRequest};
use haulier::reference::domain::RouteCode;
use mockable::Clock;
use rstest::{fixture, rstest};

use crate::test_helpers::{DispatchStack, address, order};

const WINTER_ROUTES: &str = r#"
[[routes]]
code = "BKK-EAST"
days = ["tue", "fri"]
base_fee = 4000
accepts_cod = true
active = false
coverage = [{ province = "Bangkok", district = "Bang Kapi" }]

[[routes]]
code = "BKK-EAST-2"
days = ["thu"]
base_fee = 4200
coverage = [{ province = "Bangkok", district = "Bueng Kum" }]
"#;

#[fixture]
fn stack() -> DispatchStack {
    DispatchStack::from_fixtures().expect("fixtures wire a dispatch stack")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn new_catalog_applies_to_later_plans_only(
    stack: DispatchStack,
) -> Result<(), eyre::Report> {
    let existing = stack
        .service
        .create_delivery_task(CreateDeliveryTaskRequest::new(
            order("ORD-30001")?,
            address("addr-bangkapi")?,
        ))
        .await?;
    let document = ReferenceDataDocument::from_toml_str(WINTER_ROUTES)?;

    stack
        .routes
        .replace(document.route_catalog(stack.clock.utc())?)?;

    let bang_kapi = stack
        .service
        .get_delivery_options(&address("addr-bangkapi")?)
        .await?;
    assert!(
        bang_kapi
            .iter()
            .all(|option| option.method() != &DeliveryMethod::SelfDelivery)
    );
    let bueng_kum = stack
        .service
        .get_delivery_options(&address("addr-buengkum")?)
        .await?;
    let recommended = bueng_kum
        .first()
        .ok_or_else(|| eyre::eyre!("Bueng Kum has options"))?;
    assert_eq!(
        recommended.route_code(),
        Some(&RouteCode::new("BKK-EAST-2")?)
    );

    let unchanged = stack.service.get_task(existing.id()).await?;
    assert_eq!(unchanged.route_code(), Some(&RouteCode::new("BKK-EAST")?));
    Ok(())
}
