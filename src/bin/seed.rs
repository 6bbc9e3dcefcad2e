use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use coffeehouse_api::db::{create_pool, run_migrations};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL is required to seed"))?;

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@roastery.test", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "user@roastery.test", "user1234", "user").await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email.split('@').next().unwrap_or("account"))
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        (
            "House Blend Beans 1kg",
            "Medium roast, chocolate and hazelnut notes",
            "beans",
            1890,
            120,
            true,
        ),
        (
            "Single Origin Yirgacheffe 250g",
            "Washed Ethiopian, floral and citrus",
            "beans",
            1450,
            60,
            true,
        ),
        (
            "Cold Brew Bottle 500ml",
            "Slow-steeped, ready to drink",
            "drinks",
            550,
            200,
            false,
        ),
        (
            "Ceramic Pour-Over Dripper",
            "V-shaped dripper for 1-2 cups",
            "equipment",
            2400,
            35,
            false,
        ),
        (
            "Roastery Tote Bag",
            "Heavy canvas, fits a grinder and two bags of beans",
            "merch",
            1200,
            80,
            false,
        ),
    ];

    for (name, desc, category, price, stock, featured) in products {
        let inserted: Option<(Uuid, i32)> = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, description, price, category, stock, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO NOTHING
            RETURNING id, stock
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price as i64)
        .bind(category)
        .bind(stock)
        .bind(featured)
        .fetch_optional(pool)
        .await?;

        // First insert gets its opening-stock ledger row.
        if let Some((product_id, stock)) = inserted {
            if stock > 0 {
                sqlx::query(
                    r#"
                    INSERT INTO inventory_records
                        (id, product_id, op, quantity, previous_stock, current_stock, note)
                    VALUES ($1, $2, 'add', $3, 0, $3, 'initial stock')
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(product_id)
                .bind(stock)
                .execute(pool)
                .await?;
            }
        }
    }

    println!("Seeded products");
    Ok(())
}
