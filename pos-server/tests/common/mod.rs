//! 集成测试公共设施: 临时 SQLite、固定时钟、样例菜单
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use pos_server::cache::{Cache, MemoryCache};
use pos_server::core::{ActingUserPolicy, ModifierPolicy, PaymentPolicy};
use pos_server::db::DbService;
use pos_server::db::repository::{category, meal, modifier, user};
use pos_server::utils::FixedClock;
use pos_server::{Config, ServerState};
use shared::models::{
    CategoryCreate, MealCreate, ModifierCreate, OrderCreate, OrderItemInput, PaymentInput,
    PaymentMethod, UserCreate, UserRole,
};
use tempfile::TempDir;

pub const CASHIER_EMAIL: &str = "cajero@example.com";

pub struct TestEnv {
    // 保持临时目录存活
    pub dir: TempDir,
    pub state: ServerState,
    pub clock: Arc<FixedClock>,
    pub cache: Arc<dyn Cache>,
    pub catalog: Catalog,
}

/// Seeded ids
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    /// price 50, clave "TAC" applied
    pub meal_id: i64,
    /// price 12.5, no clave
    pub drink_id: i64,
    /// priced 10, clave "QX"
    pub priced_modifier_id: i64,
    /// not priced, clave "SC"
    pub free_modifier_id: i64,
    pub cashier_id: i64,
}

/// UTC millis for `YYYY-MM-DD HH:MM`
pub fn at(datetime: &str) -> i64 {
    NaiveDateTime::parse_from_str(datetime, "%Y-%m-%d %H:%M")
        .unwrap()
        .and_utc()
        .timestamp_millis()
}

pub fn base_config(dir: &TempDir) -> Config {
    let mut config = Config::with_overrides(dir.path().to_string_lossy());
    config.timezone = "UTC".into();
    config.business_day_cutoff = "03:00".into();
    config.cache_ttl_secs = 3600;
    config.audit_buffer_size = 64;
    config.payment_policy = PaymentPolicy::Reject;
    config.modifier_policy = ModifierPolicy::Reject;
    config.acting_user_policy = ActingUserPolicy::Lenient;
    config.allow_empty_orders = true;
    config
}

pub async fn setup() -> TestEnv {
    setup_with(|_| {}, Arc::new(MemoryCache::new())).await
}

pub async fn setup_with_config(customize: impl FnOnce(&mut Config)) -> TestEnv {
    setup_with(customize, Arc::new(MemoryCache::new())).await
}

pub async fn setup_with(customize: impl FnOnce(&mut Config), cache: Arc<dyn Cache>) -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let mut config = base_config(&dir);
    customize(&mut config);

    let clock = Arc::new(FixedClock::new(at("2024-05-10 12:00")));
    let db = DbService::new(&config.database_path).await.unwrap();
    let state = ServerState::with_cache(&config, db, cache.clone(), clock.clone()).unwrap();
    let catalog = seed_catalog(&state).await;

    TestEnv {
        dir,
        state,
        clock,
        cache,
        catalog,
    }
}

async fn seed_catalog(state: &ServerState) -> Catalog {
    let pool = state.pool();
    let tacos = category::create(
        pool,
        CategoryCreate {
            category_name: "Tacos".into(),
            menu_type: "comida".into(),
        },
    )
    .await
    .unwrap();

    let meal = meal::create(
        pool,
        MealCreate {
            name: "Taco al pastor".into(),
            description: "Orden de 5".into(),
            price: 50.0,
            category_id: Some(tacos.id),
            image_url: None,
            clave: Some("TAC".into()),
            is_clave_applied: true,
        },
    )
    .await
    .unwrap();

    let drink = meal::create(
        pool,
        MealCreate {
            name: "Agua de horchata".into(),
            description: String::new(),
            price: 12.5,
            category_id: None,
            image_url: None,
            clave: None,
            is_clave_applied: false,
        },
    )
    .await
    .unwrap();

    let priced = modifier::create(
        pool,
        ModifierCreate {
            name: "Extra queso".into(),
            description: String::new(),
            has_price: true,
            price: Some(10.0),
            clave: Some("QX".into()),
            category_ids: vec![tacos.id],
        },
    )
    .await
    .unwrap();

    let free = modifier::create(
        pool,
        ModifierCreate {
            name: "Sin cebolla".into(),
            description: String::new(),
            has_price: false,
            price: None,
            clave: Some("SC".into()),
            category_ids: vec![tacos.id],
        },
    )
    .await
    .unwrap();

    let cashier = user::create(
        pool,
        UserCreate {
            name: "Caja 1".into(),
            email: CASHIER_EMAIL.into(),
            password_hash: "$argon2id$stub".into(),
            role: UserRole::Cashier,
        },
    )
    .await
    .unwrap();

    Catalog {
        meal_id: meal.id,
        drink_id: drink.id,
        priced_modifier_id: priced.id,
        free_modifier_id: free.id,
        cashier_id: cashier.id,
    }
}

pub fn line(meal_id: i64, quantity: i64, modifiers: Vec<i64>) -> OrderItemInput {
    OrderItemInput {
        meal_id,
        quantity,
        modifiers,
    }
}

pub fn cash(amount: f64) -> PaymentInput {
    PaymentInput {
        payment_method: PaymentMethod::Cash,
        amount_given: amount,
    }
}

pub fn order_request(items: Vec<OrderItemInput>, payments: Vec<PaymentInput>) -> OrderCreate {
    OrderCreate {
        client_name: "Ana".into(),
        client_phone: "555-0101".into(),
        status: None,
        items,
        payments,
    }
}

/// 1 × meal, paid exactly
pub fn simple_order(catalog: &Catalog) -> OrderCreate {
    order_request(vec![line(catalog.meal_id, 1, vec![])], vec![cash(50.0)])
}

pub async fn count_rows(env: &TestEnv, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(env.state.pool())
        .await
        .unwrap()
}

/// Poll until the audit worker has written `expected` rows (or give up)
pub async fn wait_for_logs(env: &TestEnv, expected: i64) -> i64 {
    let mut count = 0;
    for _ in 0..100 {
        count = count_rows(env, "logs").await;
        if count >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    count
}
