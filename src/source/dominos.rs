use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

use crate::error::FetchError;
use crate::markup::Document;
use crate::source::TrackerSource;
use crate::types::{parse_timestamp, split_order_lines, OrderSnapshot};

pub const DEFAULT_HOST: &str = "https://order.dominos.com";
const TRACKER_PATH: &str = "/orderstorage/GetTrackerData";

/// Client for the Dominos order-storage tracker endpoint.
#[derive(Clone)]
pub struct TrackerClient {
    host: String,
    http: reqwest::Client,
}

impl TrackerClient {
    pub fn new(host: String) -> Self {
        Self {
            host,
            http: reqwest::Client::new(),
        }
    }

    /// One GET against the tracker endpoint. `store_id` and `order_key` are
    /// forwarded verbatim as query parameters; no retries, no caching.
    pub async fn fetch(
        &self,
        store_id: &str,
        order_key: &str,
    ) -> Result<OrderSnapshot, FetchError> {
        let url = format!("{}{}", self.host.trim_end_matches('/'), TRACKER_PATH);
        let body = self
            .http
            .get(url)
            .query(&[("StoreID", store_id), ("OrderKey", order_key)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let fetched_at = Local::now().naive_local();
        parse_tracker_data(&body, store_id, order_key, fetched_at)
    }
}

#[async_trait]
impl TrackerSource for TrackerClient {
    async fn fetch(&self, store_id: &str, order_key: &str) -> Result<OrderSnapshot, FetchError> {
        TrackerClient::fetch(self, store_id, order_key).await
    }
}

/// Pure extraction from a response body. Fully formed snapshot or error,
/// never partial.
fn parse_tracker_data(
    body: &str,
    store_id: &str,
    order_key: &str,
    fetched_at: NaiveDateTime,
) -> Result<OrderSnapshot, FetchError> {
    let doc = Document::parse(body);

    let text = |tag: &str| -> Result<String, FetchError> {
        doc.tag_text(tag)
            .map(str::to_string)
            .ok_or_else(|| FetchError::malformed(format!("missing <{tag}>")))
    };

    // Empty or missing timestamp tags mean "not reached yet", not an error.
    let time = |tag: &str| -> Result<Option<NaiveDateTime>, FetchError> {
        match doc.tag_text(tag) {
            None => Ok(None),
            Some(t) => parse_timestamp(t)
                .map_err(|_| FetchError::malformed(format!("bad timestamp in <{tag}>: {t:?}"))),
        }
    };

    // The endpoint emits <orderstatus> twice; the second one is the live
    // order status, the first is a distinct unused field.
    let status = doc
        .nth_tag_text("orderstatus", 1)
        .ok_or_else(|| FetchError::malformed("missing second <orderstatus>"))?
        .to_string();

    Ok(OrderSnapshot {
        store_id: store_id.to_string(),
        order_key: order_key.to_string(),
        version: text("version")?,
        order_id: text("orderid")?,
        phone: text("phone")?,
        service_method: text("servicemethod")?,
        driver_name: text("drivername")?,
        manager_name: text("managername")?,
        driver_id: text("driverid")?,
        order_description: split_order_lines(&text("orderdescription")?),
        status,
        as_of: time("asof")?,
        start_time: time("starttime")?,
        oven_time: time("oventime")?,
        rack_time: time("racktime")?,
        route_time: time("routetime")?,
        delivery_time: time("deliverytime")?,
        fetched_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_body() -> String {
        "<soap:Envelope><TrackerData>\
         <Version>1.5</Version>\
         <OrderID>2024-03-01#42</OrderID>\
         <Phone>5550100</Phone>\
         <ServiceMethod>Delivery</ServiceMethod>\
         <OrderDescription>1 Large Pepperoni\n\n2 Garlic Bread \n</OrderDescription>\
         <DriverName>Pat</DriverName>\
         <ManagerName>Sam</ManagerName>\
         <DriverID>D77</DriverID>\
         <AsOf>2024-03-01T18:40:00</AsOf>\
         <OrderStatus>Preparing</OrderStatus>\
         <OrderStatus>Baking</OrderStatus>\
         <StartTime>2024-03-01T18:30:05</StartTime>\
         <OvenTime>2024-03-01T18:35:00</OvenTime>\
         <RackTime></RackTime>\
         <RouteTime/>\
         <DeliveryTime></DeliveryTime>\
         </TrackerData></soap:Envelope>"
            .to_string()
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(18, 41, 0)
            .unwrap()
    }

    #[test]
    fn full_document_extracts_verbatim() {
        let snap = parse_tracker_data(&sample_body(), "7777", "KEY1", now()).unwrap();
        assert_eq!(snap.store_id, "7777");
        assert_eq!(snap.order_key, "KEY1");
        assert_eq!(snap.version, "1.5");
        assert_eq!(snap.order_id, "2024-03-01#42");
        assert_eq!(snap.phone, "5550100");
        assert_eq!(snap.service_method, "Delivery");
        assert_eq!(snap.driver_name, "Pat");
        assert_eq!(snap.manager_name, "Sam");
        assert_eq!(snap.driver_id, "D77");
        assert_eq!(snap.order_description, vec!["1 Large Pepperoni", "2 Garlic Bread"]);
        assert_eq!(snap.fetched_at, now());
    }

    #[test]
    fn second_orderstatus_wins() {
        let snap = parse_tracker_data(&sample_body(), "7777", "KEY1", now()).unwrap();
        assert_eq!(snap.status, "Baking");
    }

    #[test]
    fn timestamps_parse_or_stay_absent() {
        let snap = parse_tracker_data(&sample_body(), "7777", "KEY1", now()).unwrap();
        assert_eq!(
            snap.start_time,
            Some(
                NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(18, 30, 5)
                    .unwrap()
            )
        );
        assert!(snap.oven_time.is_some());
        assert!(snap.as_of.is_some());
        // Empty and self-closing tags are both "not reached yet".
        assert_eq!(snap.rack_time, None);
        assert_eq!(snap.route_time, None);
        assert_eq!(snap.delivery_time, None);
    }

    #[test]
    fn missing_timestamp_tag_is_absent() {
        let body = sample_body().replace("<DeliveryTime></DeliveryTime>", "");
        let snap = parse_tracker_data(&body, "7777", "KEY1", now()).unwrap();
        assert_eq!(snap.delivery_time, None);
    }

    #[test]
    fn missing_required_tag_fails() {
        let body = sample_body().replace("<Phone>5550100</Phone>", "");
        let err = parse_tracker_data(&body, "7777", "KEY1", now()).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { .. }));
    }

    #[test]
    fn single_orderstatus_fails() {
        let body = sample_body().replace("<OrderStatus>Baking</OrderStatus>", "");
        let err = parse_tracker_data(&body, "7777", "KEY1", now()).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { .. }));
    }

    #[test]
    fn unparseable_timestamp_fails() {
        let body = sample_body().replace("2024-03-01T18:35:00", "soon");
        let err = parse_tracker_data(&body, "7777", "KEY1", now()).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { .. }));
    }
}
