//! Field describes from the org's REST API.

use crate::{OrgError, OrgResult, OrgSession};
use async_trait::async_trait;
use futures::{future, stream, TryStreamExt};
use permkit_format::{describe_targets, DescribeCache, FieldDescribe};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info};

/// Maximum describe requests in flight at once.
pub const DESCRIBE_CONCURRENCY: usize = 8;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of per-object field describes.
#[async_trait]
pub trait Describe: Send + Sync {
    async fn describe_fields(&self, object: &str) -> OrgResult<Vec<FieldDescribe>>;
}

#[derive(Deserialize)]
struct DescribeResponse {
    fields: Vec<FieldDescribe>,
}

/// `Describe` over `GET /services/data/vXX.X/sobjects/<object>/describe`.
pub struct RestDescriber {
    client: Client,
    base: Url,
    access_token: String,
}

impl RestDescriber {
    pub fn new(session: &OrgSession) -> OrgResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Self::with_client(client, session)
    }

    /// Use a preconfigured client, e.g. one with custom proxy settings.
    pub fn with_client(client: Client, session: &OrgSession) -> OrgResult<Self> {
        let root = format!(
            "{}/services/data/v{}/sobjects/",
            session.instance_url.trim_end_matches('/'),
            session.api_version()
        );
        let base = Url::parse(&root).map_err(|e| OrgError::InvalidUrl {
            url: root.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            client,
            base,
            access_token: session.access_token.clone(),
        })
    }

    fn describe_url(&self, object: &str) -> OrgResult<Url> {
        self.base
            .join(&format!("{}/describe", object))
            .map_err(|e| OrgError::InvalidUrl {
                url: format!("{}{}/describe", self.base, object),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl Describe for RestDescriber {
    async fn describe_fields(&self, object: &str) -> OrgResult<Vec<FieldDescribe>> {
        let url = self.describe_url(object)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrgError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let describe: DescribeResponse = response.json().await?;
        Ok(describe.fields)
    }
}

/// Object names to describe for a selection, with `Activity` replaced by `Event` and `Task`.
pub fn expand_describable<'a>(objects: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    objects
        .into_iter()
        .flat_map(describe_targets)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Describe every object concurrently.
///
/// The first failure aborts the batch: outstanding requests are dropped and
/// the error names the object that failed.
pub async fn describe_all<D>(describer: &D, objects: &[String]) -> OrgResult<DescribeCache>
where
    D: Describe + ?Sized,
{
    let total = objects.len();
    let mut done = 0usize;

    stream::iter(objects.iter().map(Ok::<&String, OrgError>))
        .map_ok(|object| async move {
            match describer.describe_fields(object).await {
                Ok(fields) => Ok((object, fields)),
                Err(source) => Err(OrgError::Describe {
                    object: object.clone(),
                    source: Box::new(source),
                }),
            }
        })
        .try_buffer_unordered(DESCRIBE_CONCURRENCY)
        .try_fold(DescribeCache::new(), |mut cache, (object, fields)| {
            done += 1;
            info!("Described {} ({}/{})", object, done, total);
            cache.insert_fields(object.clone(), fields);
            future::ready(Ok(cache))
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const ACCOUNT_DESCRIBE: &str = r#"{
        "actionOverrides": [],
        "activateable": false,
        "childRelationships": [],
        "createable": true,
        "custom": true,
        "fields": [
            {
                "aggregatable": true,
                "autoNumber": false,
                "byteLength": 18,
                "calculated": false,
                "createable": false,
                "custom": false,
                "defaultValue": null,
                "label": "Record ID",
                "length": 18,
                "name": "Id",
                "nillable": false,
                "permissionable": false,
                "picklistValues": [],
                "referenceTo": [],
                "soapType": "tns:ID",
                "type": "id",
                "updateable": false
            },
            {
                "aggregatable": false,
                "autoNumber": false,
                "byteLength": 765,
                "calculated": false,
                "createable": true,
                "custom": true,
                "defaultValue": null,
                "inlineHelpText": "Free text",
                "label": "Notes",
                "length": 255,
                "name": "Notes__c",
                "nillable": true,
                "permissionable": true,
                "picklistValues": [],
                "referenceTo": [],
                "soapType": "xsd:string",
                "type": "string",
                "updateable": true
            },
            {
                "autoNumber": false,
                "calculated": true,
                "calculatedFormula": "LEN(Notes__c)",
                "createable": false,
                "label": "Score",
                "name": "Score__c",
                "permissionable": true,
                "type": "double",
                "updateable": false
            }
        ],
        "label": "Account",
        "name": "Account__c",
        "recordTypeInfos": [],
        "urls": {
            "describe": "/services/data/v60.0/sobjects/Account__c/describe"
        }
    }"#;

    /// One-shot HTTP responder on a local port; records each raw request.
    async fn serve(status: &'static str, body: &'static str) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("addr");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                seen.lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&buf[..n]).to_string());
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{}", addr), requests)
    }

    fn local_session(instance_url: &str) -> OrgSession {
        serde_json::from_value(serde_json::json!({
            "username": "u@example.com",
            "accessToken": "00D!token",
            "instanceUrl": instance_url,
            "apiVersion": "60.0",
        }))
        .unwrap()
    }

    fn local_describer(instance_url: &str) -> RestDescriber {
        let client = Client::builder().no_proxy().build().unwrap();
        RestDescriber::with_client(client, &local_session(instance_url)).unwrap()
    }

    struct FakeDescriber {
        failing: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl FakeDescriber {
        fn new(failing: Option<&'static str>) -> Self {
            Self {
                failing,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Describe for FakeDescriber {
        async fn describe_fields(&self, object: &str) -> OrgResult<Vec<FieldDescribe>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing == Some(object) {
                return Err(OrgError::Api {
                    status: 404,
                    body: "NOT_FOUND".to_string(),
                });
            }
            Ok(vec![FieldDescribe {
                name: format!("{}_Field__c", object),
                createable: true,
                updateable: true,
                permissionable: true,
            }])
        }
    }

    fn names(objects: &[&str]) -> Vec<String> {
        objects.iter().map(|o| o.to_string()).collect()
    }

    #[tokio::test]
    async fn test_describe_all_fills_cache() {
        let describer = FakeDescriber::new(None);
        let cache = describe_all(&describer, &names(&["A__c", "B__c", "C__c"]))
            .await
            .unwrap();

        assert_eq!(cache.len(), 3);
        assert!(cache.field("B__c", "B__c_Field__c").is_some());
        assert_eq!(describer.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_describe_all_fails_whole_batch() {
        let describer = FakeDescriber::new(Some("Bad__c"));
        let err = describe_all(&describer, &names(&["A__c", "Bad__c", "C__c"]))
            .await
            .unwrap_err();

        match err {
            OrgError::Describe { object, source } => {
                assert_eq!(object, "Bad__c");
                assert!(matches!(*source, OrgError::Api { status: 404, .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_describe_all_empty() {
        let describer = FakeDescriber::new(None);
        let cache = describe_all(&describer, &[]).await.unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_decode_full_describe_body() {
        let describe: DescribeResponse = serde_json::from_str(ACCOUNT_DESCRIBE).unwrap();
        assert_eq!(
            describe.fields,
            vec![
                FieldDescribe {
                    name: "Id".to_string(),
                    createable: false,
                    updateable: false,
                    permissionable: false,
                },
                FieldDescribe {
                    name: "Notes__c".to_string(),
                    createable: true,
                    updateable: true,
                    permissionable: true,
                },
                FieldDescribe {
                    name: "Score__c".to_string(),
                    createable: false,
                    updateable: false,
                    permissionable: true,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_rest_describe_sends_bearer_token() {
        let (url, requests) = serve("200 OK", ACCOUNT_DESCRIBE).await;

        let fields = local_describer(&url)
            .describe_fields("Account__c")
            .await
            .unwrap();
        assert_eq!(fields.len(), 3);
        assert!(fields.iter().any(|f| f.name == "Notes__c" && f.editable()));

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = requests[0].to_lowercase();
        assert!(request.starts_with("get /services/data/v60.0/sobjects/account__c/describe "));
        assert!(request.contains("authorization: bearer 00d!token"));
    }

    #[tokio::test]
    async fn test_rest_describe_error_status() {
        let body = r#"[{"errorCode":"NOT_FOUND","message":"The requested resource does not exist"}]"#;
        let (url, _) = serve("404 Not Found", body).await;

        let err = local_describer(&url)
            .describe_fields("Ghost__c")
            .await
            .unwrap_err();
        match err {
            OrgError::Api { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("NOT_FOUND"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_expand_describable() {
        assert_eq!(
            expand_describable(["Activity", "Account", "Task"]),
            vec!["Account", "Event", "Task"]
        );
    }

    #[test]
    fn test_describe_url() {
        let session: OrgSession = serde_json::from_value(serde_json::json!({
            "username": "u@example.com",
            "accessToken": "token",
            "instanceUrl": "https://example.my.salesforce.com/",
            "apiVersion": "60.0",
        }))
        .unwrap();
        let describer = RestDescriber::new(&session).unwrap();
        assert_eq!(
            describer.describe_url("Account__c").unwrap().as_str(),
            "https://example.my.salesforce.com/services/data/v60.0/sobjects/Account__c/describe"
        );
    }
}
