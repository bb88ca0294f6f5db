//! SQL storage helpers for heroes, powers and hero powers.
//!
//! Reads return `Option` and leave the `404` decision to handlers. Writes
//! return `ApiError` directly, because they may fail validation against the
//! stored state or hit a constraint. Every multi-statement write runs in one
//! transaction, including the cascade deletes of `hero_powers` rows.

use sqlx::{Row, SqliteConnection, SqlitePool, sqlite::SqliteRow};
use tracing::{Instrument, debug, info_span};

use super::{
    error::{ApiError, Entity},
    types::{
        HeroChanges, HeroDetail, HeroPowerResponse, HeroPowerWithHero, HeroPowerWithPower,
        HeroSummary, NewHero, NewHeroPower, NewPower, PowerChanges, PowerDetail, PowerSummary,
    },
    validation::validate_description,
};

fn hero_summary(row: &SqliteRow) -> Result<HeroSummary, sqlx::Error> {
    Ok(HeroSummary {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        super_name: row.try_get("super_name")?,
    })
}

fn power_summary(row: &SqliteRow) -> Result<PowerSummary, sqlx::Error> {
    Ok(PowerSummary {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
    })
}

/// Lists every hero as a summary, ordered by id.
pub(super) async fn fetch_heroes(pool: &SqlitePool) -> Result<Vec<HeroSummary>, sqlx::Error> {
    let rows = sqlx::query("SELECT id, name, super_name FROM heroes ORDER BY id")
        .fetch_all(pool)
        .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "SELECT"))
        .await?;
    rows.iter().map(hero_summary).collect()
}

/// Loads a hero with its associations, each carrying the linked power.
async fn load_hero_detail(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<HeroDetail>, sqlx::Error> {
    let Some(row) = sqlx::query("SELECT id, name, super_name FROM heroes WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };
    let hero = hero_summary(&row)?;

    let rows = sqlx::query(
        r"
        SELECT
            hp.id,
            hp.strength,
            hp.hero_id,
            hp.power_id,
            p.name AS power_name,
            p.description AS power_description
        FROM hero_powers hp
        JOIN powers p ON p.id = hp.power_id
        WHERE hp.hero_id = ?1
        ORDER BY hp.id
        ",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let hero_powers = rows
        .iter()
        .map(|row| {
            Ok(HeroPowerWithPower {
                id: row.try_get("id")?,
                strength: row.try_get("strength")?,
                hero_id: row.try_get("hero_id")?,
                power_id: row.try_get("power_id")?,
                power: PowerSummary {
                    id: row.try_get("power_id")?,
                    name: row.try_get("power_name")?,
                    description: row.try_get("power_description")?,
                },
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    Ok(Some(HeroDetail {
        id: hero.id,
        name: hero.name,
        super_name: hero.super_name,
        hero_powers,
    }))
}

/// Fetches a hero detail; `None` when the id does not exist.
pub(super) async fn fetch_hero_detail(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<HeroDetail>, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    load_hero_detail(&mut conn, id)
        .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "SELECT"))
        .await
}

/// Inserts a hero and returns its (empty) detail.
pub(super) async fn insert_hero(pool: &SqlitePool, hero: &NewHero) -> Result<HeroDetail, ApiError> {
    let row = sqlx::query(
        r"
        INSERT INTO heroes (name, super_name)
        VALUES (?1, ?2)
        RETURNING id, name, super_name
        ",
    )
    .bind(&hero.name)
    .bind(&hero.super_name)
    .fetch_one(pool)
    .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "INSERT"))
    .await?;
    let hero = hero_summary(&row)?;

    debug!("Inserted hero {}", hero.id);

    Ok(HeroDetail {
        id: hero.id,
        name: hero.name,
        super_name: hero.super_name,
        hero_powers: Vec::new(),
    })
}

/// Applies a partial hero update and returns the refreshed detail.
/// Fields left as `None` keep their stored value.
pub(super) async fn update_hero(
    pool: &SqlitePool,
    id: i64,
    changes: &HeroChanges,
) -> Result<HeroDetail, ApiError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r"
        UPDATE heroes
        SET
            name = COALESCE(?1, name),
            super_name = COALESCE(?2, super_name)
        WHERE id = ?3
        ",
    )
    .bind(changes.name.as_deref())
    .bind(changes.super_name.as_deref())
    .bind(id)
    .execute(&mut *tx)
    .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "UPDATE"))
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(ApiError::NotFound(Entity::Hero));
    }

    let detail = load_hero_detail(&mut tx, id)
        .await?
        .ok_or(ApiError::NotFound(Entity::Hero))?;

    tx.commit().await?;

    Ok(detail)
}

/// Returns `true` when a hero with `id` exists.
pub(super) async fn hero_exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM heroes WHERE id = ?1) AS found")
        .bind(id)
        .fetch_one(pool)
        .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "SELECT"))
        .await?;
    let found: i64 = row.try_get("found")?;
    Ok(found != 0)
}

/// Deletes a hero together with every `hero_powers` row that references it.
pub(super) async fn delete_hero(pool: &SqlitePool, id: i64) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    let cascaded = sqlx::query("DELETE FROM hero_powers WHERE hero_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "DELETE"))
        .await?;

    let deleted = sqlx::query("DELETE FROM heroes WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "DELETE"))
        .await?;

    if deleted.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(ApiError::NotFound(Entity::Hero));
    }

    tx.commit().await?;

    debug!(
        "Deleted hero {id} and {} hero powers",
        cascaded.rows_affected()
    );

    Ok(())
}

/// Lists every power as a summary, ordered by id.
pub(super) async fn fetch_powers(pool: &SqlitePool) -> Result<Vec<PowerSummary>, sqlx::Error> {
    let rows = sqlx::query("SELECT id, name, description FROM powers ORDER BY id")
        .fetch_all(pool)
        .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "SELECT"))
        .await?;
    rows.iter().map(power_summary).collect()
}

/// Loads a power with its associations, each carrying the linked hero.
async fn load_power_detail(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<PowerDetail>, sqlx::Error> {
    let Some(row) = sqlx::query("SELECT id, name, description FROM powers WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };
    let power = power_summary(&row)?;

    let rows = sqlx::query(
        r"
        SELECT
            hp.id,
            hp.strength,
            hp.hero_id,
            hp.power_id,
            h.name AS hero_name,
            h.super_name AS hero_super_name
        FROM hero_powers hp
        JOIN heroes h ON h.id = hp.hero_id
        WHERE hp.power_id = ?1
        ORDER BY hp.id
        ",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let hero_powers = rows
        .iter()
        .map(|row| {
            Ok(HeroPowerWithHero {
                id: row.try_get("id")?,
                strength: row.try_get("strength")?,
                hero_id: row.try_get("hero_id")?,
                power_id: row.try_get("power_id")?,
                hero: HeroSummary {
                    id: row.try_get("hero_id")?,
                    name: row.try_get("hero_name")?,
                    super_name: row.try_get("hero_super_name")?,
                },
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    Ok(Some(PowerDetail {
        id: power.id,
        name: power.name,
        description: power.description,
        hero_powers,
    }))
}

/// Fetches a power detail; `None` when the id does not exist.
pub(super) async fn fetch_power_detail(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<PowerDetail>, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    load_power_detail(&mut conn, id)
        .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "SELECT"))
        .await
}

/// Inserts a power and returns its (empty) detail. Callers validate the description first.
pub(super) async fn insert_power(
    pool: &SqlitePool,
    power: &NewPower,
) -> Result<PowerDetail, ApiError> {
    let row = sqlx::query(
        r"
        INSERT INTO powers (name, description)
        VALUES (?1, ?2)
        RETURNING id, name, description
        ",
    )
    .bind(&power.name)
    .bind(&power.description)
    .fetch_one(pool)
    .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "INSERT"))
    .await?;
    let power = power_summary(&row)?;

    debug!("Inserted power {}", power.id);

    Ok(PowerDetail {
        id: power.id,
        name: power.name,
        description: power.description,
        hero_powers: Vec::new(),
    })
}

/// Applies a partial power update atomically.
///
/// The `UPDATE` runs first so the transaction holds the write lock from its
/// first statement. The merged description it returns is then validated, and
/// the transaction is rolled back when it is too short, so a rejected request
/// changes no field.
pub(super) async fn update_power(
    pool: &SqlitePool,
    id: i64,
    changes: &PowerChanges,
) -> Result<PowerDetail, ApiError> {
    let mut tx = pool.begin().await?;

    let Some(row) = sqlx::query(
        r"
        UPDATE powers
        SET
            name = COALESCE(?1, name),
            description = COALESCE(?2, description)
        WHERE id = ?3
        RETURNING description
        ",
    )
    .bind(changes.name.as_deref())
    .bind(changes.description.as_deref())
    .bind(id)
    .fetch_optional(&mut *tx)
    .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "UPDATE"))
    .await?
    else {
        tx.rollback().await?;
        return Err(ApiError::NotFound(Entity::Power));
    };

    let description: String = row.try_get("description")?;
    if let Err(err) = validate_description(&description) {
        tx.rollback().await?;
        return Err(err.into());
    }

    let detail = load_power_detail(&mut tx, id)
        .await?
        .ok_or(ApiError::NotFound(Entity::Power))?;

    tx.commit().await?;

    Ok(detail)
}

/// Returns `true` when a power with `id` exists.
pub(super) async fn power_exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM powers WHERE id = ?1) AS found")
        .bind(id)
        .fetch_one(pool)
        .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "SELECT"))
        .await?;
    let found: i64 = row.try_get("found")?;
    Ok(found != 0)
}

/// Deletes a power together with every `hero_powers` row that references it.
pub(super) async fn delete_power(pool: &SqlitePool, id: i64) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;

    let cascaded = sqlx::query("DELETE FROM hero_powers WHERE power_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "DELETE"))
        .await?;

    let deleted = sqlx::query("DELETE FROM powers WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "DELETE"))
        .await?;

    if deleted.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(ApiError::NotFound(Entity::Power));
    }

    tx.commit().await?;

    debug!(
        "Deleted power {id} and {} hero powers",
        cascaded.rows_affected()
    );

    Ok(())
}

const HERO_POWER_SELECT: &str = r"
    SELECT
        hp.id,
        hp.strength,
        hp.hero_id,
        hp.power_id,
        h.name AS hero_name,
        h.super_name AS hero_super_name,
        p.name AS power_name,
        p.description AS power_description
    FROM hero_powers hp
    JOIN heroes h ON h.id = hp.hero_id
    JOIN powers p ON p.id = hp.power_id
";

fn hero_power_response(row: &SqliteRow) -> Result<HeroPowerResponse, sqlx::Error> {
    Ok(HeroPowerResponse {
        id: row.try_get("id")?,
        strength: row.try_get("strength")?,
        hero_id: row.try_get("hero_id")?,
        power_id: row.try_get("power_id")?,
        hero: HeroSummary {
            id: row.try_get("hero_id")?,
            name: row.try_get("hero_name")?,
            super_name: row.try_get("hero_super_name")?,
        },
        power: PowerSummary {
            id: row.try_get("power_id")?,
            name: row.try_get("power_name")?,
            description: row.try_get("power_description")?,
        },
    })
}

async fn load_hero_power(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<HeroPowerResponse>, sqlx::Error> {
    let query = format!("{HERO_POWER_SELECT} WHERE hp.id = ?1");
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(hero_power_response).transpose()
}

/// Lists every hero power with its hero and power, ordered by id.
pub(super) async fn fetch_hero_powers(
    pool: &SqlitePool,
) -> Result<Vec<HeroPowerResponse>, sqlx::Error> {
    let query = format!("{HERO_POWER_SELECT} ORDER BY hp.id");
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "SELECT"))
        .await?;
    rows.iter().map(hero_power_response).collect()
}

/// Fetches a single hero power; `None` when the id does not exist.
pub(super) async fn fetch_hero_power(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<HeroPowerResponse>, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    load_hero_power(&mut conn, id)
        .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "SELECT"))
        .await
}

/// Inserts a hero power and returns it with its hero and power.
/// Dangling `hero_id`/`power_id` values fail on the foreign keys and map to `ApiError::Constraint`.
pub(super) async fn insert_hero_power(
    pool: &SqlitePool,
    hero_power: &NewHeroPower,
) -> Result<HeroPowerResponse, ApiError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r"
        INSERT INTO hero_powers (strength, hero_id, power_id)
        VALUES (?1, ?2, ?3)
        RETURNING id
        ",
    )
    .bind(hero_power.strength.as_str())
    .bind(hero_power.hero_id)
    .bind(hero_power.power_id)
    .fetch_one(&mut *tx)
    .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "INSERT"))
    .await?;
    let id: i64 = row.try_get("id")?;

    let created = load_hero_power(&mut tx, id)
        .await?
        .ok_or(ApiError::NotFound(Entity::HeroPower))?;

    tx.commit().await?;

    debug!(
        "Linked hero {} to power {} as {}",
        created.hero_id,
        created.power_id,
        created.strength.as_str()
    );

    Ok(created)
}

/// Deletes a single hero power.
pub(super) async fn delete_hero_power(pool: &SqlitePool, id: i64) -> Result<(), ApiError> {
    let deleted = sqlx::query("DELETE FROM hero_powers WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .instrument(info_span!("db.query", db.system = "sqlite", db.operation = "DELETE"))
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(ApiError::NotFound(Entity::HeroPower));
    }

    Ok(())
}
