// src/cache/mod.rs

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use self::memory::InMemoryCache;
pub use self::redis::RedisCache;

// Erro do serviço de cache. Fica FORA do AppError de propósito: o agregador
// de disponibilidade degrada para recálculo no ledger e loga; uma falha de
// cache nunca derruba a requisição.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Erro no serviço de cache: {0}")]
    Backend(#[from] ::redis::RedisError),
}

// Interface injetada do cache de disponibilidade (snapshots serializados).
// A invalidação é por padrão de chave, não por intervalo exato: os intervalos
// possíveis são ilimitados, então derrubamos por prefixo.
#[async_trait]
pub trait AvailabilityCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    // Remove todas as chaves que casam com o padrão (glob no estilo Redis,
    // ex.: "availability:*"). Devolve quantas foram removidas.
    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, CacheError>;
}
