//! Data access layer

use crate::{Error, Result};
use keyward_core::{KdfParams, KeyFingerprint, KeyRecord, KeyRole, SealedSeed, SeedHash};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository for database operations
pub struct Repository<'a> {
    conn: &'a Connection,
}

impl<'a> Repository<'a> {
    /// Create repository
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Key records of `role` in stored order
    pub fn load_keys(&self, role: KeyRole) -> Result<Vec<KeyRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT path_index, fingerprint FROM key_records WHERE role = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![role.prefix()], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (path_index, fingerprint) = row?;
            let fingerprint = KeyFingerprint::from_hex(&fingerprint)
                .map_err(|e| Error::Corrupt(format!("{role} index {path_index}: {e}")))?;
            records.push(KeyRecord::new(role, path_index, fingerprint));
        }
        Ok(records)
    }

    /// Replace the key records of `role`. Must run inside a transaction
    /// for the overwrite to be atomic.
    pub fn replace_keys(&self, role: KeyRole, records: &[KeyRecord]) -> Result<()> {
        self.conn.execute(
            "DELETE FROM key_records WHERE role = ?1",
            params![role.prefix()],
        )?;
        let mut stmt = self.conn.prepare(
            "INSERT INTO key_records (role, position, path_index, fingerprint)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (position, record) in records.iter().enumerate() {
            stmt.execute(params![
                role.prefix(),
                position as i64,
                record.path_index,
                record.fingerprint.to_hex()
            ])?;
        }
        Ok(())
    }

    /// The sealed seed, if stored
    pub fn load_sealed(&self) -> Result<Option<SealedSeed>> {
        let row = self
            .conn
            .query_row(
                "SELECT seed_hash, salt, kdf, sealed_entropy, created_at
                 FROM sealed_seed WHERE slot = 0",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((seed_hash, salt, kdf, sealed_entropy, created_at)) = row else {
            return Ok(None);
        };
        let seed_hash =
            SeedHash::from_hex(&seed_hash).map_err(|e| Error::Corrupt(e.to_string()))?;
        let kdf: KdfParams = serde_json::from_str(&kdf)?;
        Ok(Some(SealedSeed {
            seed_hash,
            salt,
            kdf,
            sealed_entropy,
            created_at,
        }))
    }

    /// Store the sealed seed, replacing any previous one
    pub fn save_sealed(&self, sealed: &SealedSeed) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sealed_seed
             (slot, seed_hash, salt, kdf, sealed_entropy, created_at)
             VALUES (0, ?1, ?2, ?3, ?4, ?5)",
            params![
                sealed.seed_hash.as_str(),
                sealed.salt,
                serde_json::to_string(&sealed.kdf)?,
                sealed.sealed_entropy,
                sealed.created_at
            ],
        )?;
        Ok(())
    }

    /// Delete the sealed seed
    pub fn clear_sealed(&self) -> Result<()> {
        self.conn.execute("DELETE FROM sealed_seed", [])?;
        Ok(())
    }
}
