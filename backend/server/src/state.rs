use std::sync::Arc;

use bank::{SpeciesBank, get_bank, get_bank_remote};
use tracing::info;

use super::{config::Config, error::AppError, favourites::FavouriteStore};

pub struct State {
    pub bank: SpeciesBank,
    pub config: Config,
    pub favourites: FavouriteStore,
}

impl State {
    pub async fn new() -> Result<Arc<Self>, AppError> {
        let config = Config::load()?;

        let bank = match &config.bank_url {
            Some(url) => {
                info!("Fetching bank from {url}");
                get_bank_remote(url).await?
            }
            None => {
                info!("Reading bank from {}", config.bank_path.display());
                get_bank(&config.bank_path)?
            }
        };

        Self::from_parts(SpeciesBank::from_bank(bank), config)
    }

    pub fn from_parts(bank: SpeciesBank, config: Config) -> Result<Arc<Self>, AppError> {
        info!("Loaded species: {}", bank.len());

        let favourites = FavouriteStore::new(&config.data_dir, config.fav_cooldown)?;

        Ok(Arc::new(Self {
            bank,
            config,
            favourites,
        }))
    }
}
