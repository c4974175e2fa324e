use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

/// In-process CMS catalog plus media host.
///
/// Catalogs live under `/{live,dead,empty,broken}/api`; media under `/media/`.
/// Only `/media/ok.*` answers 200 and `/media/forbidden.*` answers 403.
pub struct CmsStub {
    pub base_url: String,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CmsStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start cms stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");
        let media = format!("{base_url}/media");

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));

                if let Some(file) = path.strip_prefix("/media/") {
                    let status = if file.starts_with("ok.") {
                        200
                    } else if file.starts_with("forbidden.") {
                        403
                    } else {
                        404
                    };
                    let _ = request.respond(tiny_http::Response::empty(status));
                    continue;
                }

                let list = match (path, ids_param(query)) {
                    ("/broken/api", _) => {
                        let _ = request.respond(
                            tiny_http::Response::from_string("bad gateway").with_status_code(502),
                        );
                        continue;
                    }
                    ("/empty/api", _) => Vec::new(),
                    ("/live/api", None) => live_search(&media),
                    ("/dead/api", None) => dead_search(&media),
                    ("/live/api", Some(id)) => live_detail(&media, &id).into_iter().collect(),
                    _ => {
                        let _ = request.respond(
                            tiny_http::Response::from_string("not found").with_status_code(404),
                        );
                        continue;
                    }
                };

                let body = json!({ "code": 1, "msg": "ok", "list": list }).to_string();
                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                let _ = request.respond(
                    tiny_http::Response::from_string(body)
                        .with_status_code(200)
                        .with_header(header),
                );
            }
        });

        Self {
            base_url,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Registry YAML pointing every source at this stub.
    #[allow(dead_code)]
    pub fn sources_yaml(&self) -> String {
        let base = &self.base_url;
        format!(
            r#"sources:
  - id: live
    name: Live Source
    apiUrl: "{base}/live/api"
    priority: 1
  - id: dead
    name: Dead Source
    apiUrl: "{base}/dead/api"
    priority: 2
  - id: empty
    name: Empty Source
    apiUrl: "{base}/empty/api"
    priority: 3
  - id: broken
    name: Broken Source
    apiUrl: "{base}/broken/api"
    priority: 4
  - id: retired
    name: Retired Source
    apiUrl: "{base}/retired/api"
    enabled: false
"#
        )
    }
}

impl Drop for CmsStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn ids_param(query: &str) -> Option<String> {
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("ids="))
        .map(str::to_owned)
}

fn vod(id: i64, name: &str, play_url: String) -> Value {
    json!({
        "vod_id": id,
        "vod_name": name,
        "vod_pic": format!("https://img.example.com/{id}.jpg"),
        "vod_play_url": play_url,
        "vod_year": "2010",
        "vod_remarks": "HD",
        "type_name": "Movie",
        "vod_content": "A thief who steals corporate secrets.",
        "vod_actor": "Leonardo DiCaprio",
        "vod_director": "Christopher Nolan",
        "vod_area": "US",
    })
}

fn season(media: &str, len: usize, manifest_at: Option<usize>) -> String {
    (1..=len)
        .map(|n| {
            if Some(n) == manifest_at {
                format!("EP{n}${media}/missing{n}/index.m3u8")
            } else {
                format!("EP{n}${media}/missing{n}.mp4")
            }
        })
        .collect::<Vec<_>>()
        .join("#")
}

fn live_search(media: &str) -> Vec<Value> {
    let mut list = vec![vod(1, "Inception", format!("HD${media}/ok.m3u8"))];
    for id in 2..=5 {
        list.push(vod(id, &format!("Inception {id}"), season(media, 2, None)));
    }
    list
}

fn dead_search(media: &str) -> Vec<Value> {
    (1..=3)
        .map(|id| vod(id, "Inception", format!("HD${media}/gone{id}.mp4")))
        .collect()
}

fn live_detail(media: &str, id: &str) -> Option<Value> {
    match id {
        // Ten dead progressive episodes.
        "10" => Some(vod(10, "Dead Season", season(media, 10, None))),
        // Dead samples, manifest at episode 7.
        "11" => Some(vod(11, "Manifest Season", season(media, 10, Some(7)))),
        "12" => Some(vod(
            12,
            "Healthy Season",
            format!("EP1${media}/ok.mp4#EP2${media}/forbidden.mp4#EP3${media}/ok.flv"),
        )),
        _ => None,
    }
}
