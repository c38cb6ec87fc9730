#![allow(dead_code, unused_imports)]

pub use mysqldiff::mysql::{ConnectionConfig, MySqlConnection};
pub use sqlx::Executor;
pub use testcontainers::runners::AsyncRunner;
pub use testcontainers::ContainerAsync;
pub use testcontainers_modules::mysql::Mysql;

/// Starts a throwaway MySQL server. The root account has no password.
pub async fn setup_mysql() -> (ContainerAsync<Mysql>, u16) {
    let container = Mysql::default().start().await.unwrap();
    let port = container.get_host_port_ipv4(3306).await.unwrap();
    (container, port)
}

pub fn database_url(port: u16, database: &str) -> String {
    format!("mysql://root@127.0.0.1:{port}/{database}")
}

async fn connect(url: &str) -> MySqlConnection {
    let config = ConnectionConfig::parse(url).unwrap();
    MySqlConnection::new(&config).await.unwrap()
}

/// Creates `database` on the server and runs `statements` inside it.
/// Returns the URL of the new database.
pub async fn create_database(port: u16, database: &str, statements: &[&str]) -> String {
    let admin = connect(&database_url(port, "test")).await;
    admin
        .pool()
        .execute(format!("CREATE DATABASE `{database}`").as_str())
        .await
        .unwrap();

    let url = database_url(port, database);
    let connection = connect(&url).await;
    for statement in statements {
        connection.pool().execute(*statement).await.unwrap();
    }
    url
}
