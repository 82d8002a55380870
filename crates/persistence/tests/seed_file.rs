//! Integration tests for seeding the in-memory store from JSON

use std::io::Write;

use guest_insights_core::{Channel, RecordIssue, UNCATEGORIZED};
use guest_insights_persistence::{
    InMemoryStore, PersistenceError, RecordSource, TagStateStore, TimeRange,
};

const SEED: &str = r#"{
  "restaurants": [
    {
      "restaurant": { "id": "r-1", "name": "Corner Bistro", "utc_offset_minutes": 330 },
      "orders": [
        {
          "id": "o1",
          "customer_id": "c-1",
          "timestamp": "2026-01-03T13:15:00Z",
          "total_amount": 42.5,
          "channel": "delivery",
          "items": [
            { "id": "i1", "category": "mains", "price": 18.0, "quantity": 2 },
            { "id": "i2", "category": "drinks", "price": 6.5, "is_discounted": true }
          ]
        },
        { "id": "o2", "customer_id": "c-2", "total_amount": 12.0 }
      ],
      "reviews": [
        { "id": "rv1", "customer_id": "c-1", "order_id": "o1", "rating": 5, "created_at": "2026-01-04T09:00:00Z" }
      ],
      "contacts": [
        { "id": "c-1", "name": "Asha", "phone": "+91-98000-00000" }
      ],
      "prior_tags": {
        "c-1": { "tags": { "spend_tag": "vip", "activity_tag": "loyal" }, "total_visits": 12 }
      }
    }
  ]
}"#;

fn write_seed(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_seed_file_loads_plain_records() {
    let file = write_seed(SEED);
    let store = InMemoryStore::from_json_file(file.path()).unwrap();

    let restaurant = store.restaurant("r-1").await.unwrap();
    assert_eq!(restaurant.name.as_deref(), Some("Corner Bistro"));
    assert_eq!(restaurant.offset().local_minus_utc(), 330 * 60);

    let orders = store.orders("r-1", TimeRange::all()).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].channel, Channel::Delivery);
    assert_eq!(orders[0].items[1].quantity, 1);
    assert!(orders[0].items[1].is_discounted);

    // The record without a timestamp is still served; validation rejects it
    assert!(matches!(
        orders[1].clone().validate(),
        Err(RecordIssue::MissingTimestamp { .. })
    ));

    let prior = store.prior_tags("r-1").await.unwrap();
    assert_eq!(prior["c-1"].total_visits, 12);
    assert_eq!(store.contacts("r-1").await.unwrap()[0].name.as_deref(), Some("Asha"));
    assert_eq!(store.reviews("r-1", TimeRange::all()).await.unwrap().len(), 1);
}

#[test]
fn test_missing_seed_file() {
    assert!(matches!(
        InMemoryStore::from_json_file("/nonexistent/seed.json"),
        Err(PersistenceError::Io(_))
    ));
}

#[test]
fn test_malformed_seed_file() {
    let file = write_seed("{ \"restaurants\": [ { \"orders\": 3 } ] }");
    assert!(matches!(
        InMemoryStore::from_json_file(file.path()),
        Err(PersistenceError::Serialization(_))
    ));
}

#[tokio::test]
async fn test_incomplete_records_do_not_reject_the_seed() {
    let file = write_seed(
        r#"{
  "restaurants": [
    {
      "restaurant": { "id": "r-1" },
      "orders": [
        { "id": "o1", "customer_id": "c-1", "timestamp": "2026-01-03T13:15:00Z", "total_amount": 9.0,
          "items": [ { "id": "i1", "price": 9.0 }, { "category": "drinks" } ] }
      ],
      "reviews": [
        { "id": "rv1", "customer_id": "c-1", "created_at": "2026-01-04T09:00:00Z" }
      ]
    },
    { "restaurant": { "id": "r-2" } }
  ]
}"#,
    );
    let store = InMemoryStore::from_json_file(file.path()).unwrap();
    assert_eq!(store.restaurants().await.unwrap().len(), 2);

    let orders = store.orders("r-1", TimeRange::all()).await.unwrap();
    let order = orders[0].clone().validate().unwrap();
    assert_eq!(order.items[0].category, UNCATEGORIZED);
    assert_eq!(order.items[1].price, 0.0);

    let reviews = store.reviews("r-1", TimeRange::all()).await.unwrap();
    assert!(matches!(
        reviews[0].clone().validate(),
        Err(RecordIssue::MissingRating { .. })
    ));
}
