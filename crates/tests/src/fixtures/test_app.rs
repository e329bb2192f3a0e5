use mongodb::{Client, Database, options::ClientOptions};
use std::net::SocketAddr;
use teamforge_api::{build_router, state::AppState};
use teamforge_config::Settings;
use teamforge_db::indexes::ensure_indexes;
use tokio::net::TcpListener;

/// A running test application with its own MongoDB database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub db: Database,
    pub settings: Settings,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn a new test server connected to the test MongoDB.
    ///
    /// Requires a running MongoDB at localhost:27017.
    /// Set TEAMFORGE__DATABASE__URL env var to override the connection
    /// string. Each test gets a unique database name for isolation.
    pub async fn spawn() -> Self {
        let db_name = format!("teamforge_test_{}", uuid::Uuid::new_v4().simple());

        let mut settings = Settings::load().expect("Failed to load settings");
        if let Ok(url) = std::env::var("TEAMFORGE__DATABASE__URL") {
            settings.database.url = url;
        }
        settings.database.name = db_name.clone();

        let client_options = ClientOptions::parse(&settings.database.url)
            .await
            .expect("Failed to parse MongoDB URL");
        let mongo_client =
            Client::with_options(client_options).expect("Failed to create MongoDB client");
        let db = mongo_client.database(&db_name);

        ensure_indexes(&db).await.expect("Failed to create indexes");

        let app_state = AppState::new(db.clone(), settings.clone());
        let app = build_router(app_state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}", addr);
        let client = reqwest::Client::new();

        Self {
            addr,
            base_url,
            db,
            settings,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get_as(&self, path: &str, actor_id: &str, actor_type: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("X-Actor-Id", actor_id)
            .header("X-Actor-Type", actor_type)
    }

    pub fn post_as(&self, path: &str, actor_id: &str, actor_type: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("X-Actor-Id", actor_id)
            .header("X-Actor-Type", actor_type)
    }

    pub fn put_as(&self, path: &str, actor_id: &str, actor_type: &str) -> reqwest::RequestBuilder {
        self.client
            .put(self.url(path))
            .header("X-Actor-Id", actor_id)
            .header("X-Actor-Type", actor_type)
    }

    pub fn delete_as(
        &self,
        path: &str,
        actor_id: &str,
        actor_type: &str,
    ) -> reqwest::RequestBuilder {
        self.client
            .delete(self.url(path))
            .header("X-Actor-Id", actor_id)
            .header("X-Actor-Type", actor_type)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let db = self.db.clone();
        // Best effort cleanup: drop the test database
        tokio::spawn(async move {
            let _ = db.drop().await;
        });
    }
}
