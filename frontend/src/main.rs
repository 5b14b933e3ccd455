use dotenvy::dotenv;
use shop_admin::config::AdminConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AdminConfig::from_env()?;
    shop_admin::run(config).await
}
