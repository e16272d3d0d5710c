#![forbid(unsafe_code)]

use cartracker_contracts::car::{Car, Vin};

use crate::stub::{ChaincodeStub, LedgerError};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("stored car '{key}' could not be decoded: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("car '{key}' could not be encoded: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Typed repository interface for car records kept under their VIN.
pub trait CarRepo {
    /// Raw stored bytes of the car, exactly as last written.
    fn car_bytes(&mut self, vin: &Vin) -> Result<Option<Vec<u8>>, StorageError>;

    fn load_car(&mut self, vin: &Vin) -> Result<Option<Car>, StorageError>;

    /// Rewrites the whole record under `car.vin`.
    fn store_car(&mut self, car: &Car) -> Result<(), StorageError>;

    /// Bytes of the single most recent version preceding the current one.
    /// Older versions are not consulted. A delete marker yields empty bytes.
    fn prior_car_bytes(&mut self, vin: &Vin) -> Result<Option<Vec<u8>>, StorageError>;
}

impl<S> CarRepo for S
where
    S: ChaincodeStub + ?Sized,
{
    fn car_bytes(&mut self, vin: &Vin) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.get_state(vin.as_str())?)
    }

    fn load_car(&mut self, vin: &Vin) -> Result<Option<Car>, StorageError> {
        let Some(bytes) = self.car_bytes(vin)? else {
            return Ok(None);
        };
        let car = Car::from_ledger_bytes(&bytes).map_err(|source| StorageError::Decode {
            key: vin.as_str().to_string(),
            source,
        })?;
        Ok(Some(car))
    }

    fn store_car(&mut self, car: &Car) -> Result<(), StorageError> {
        let bytes = car.to_ledger_bytes().map_err(|source| StorageError::Encode {
            key: car.vin.as_str().to_string(),
            source,
        })?;
        tracing::debug!(vin = %car.vin, bytes = bytes.len(), "put car state");
        self.put_state(car.vin.as_str(), bytes)?;
        Ok(())
    }

    fn prior_car_bytes(&mut self, vin: &Vin) -> Result<Option<Vec<u8>>, StorageError> {
        let mut history = self.history_for_key(vin.as_str())?;
        match history.next() {
            Some(modification) => {
                let modification = modification?;
                if modification.is_delete {
                    return Ok(Some(Vec::new()));
                }
                Ok(Some(modification.value))
            }
            None => Ok(None),
        }
    }
}
