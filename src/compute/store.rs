use crate::{tensor_graph::TensorId, utils::error::HarnessError};

/// Per-execution tensor slots indexed by `TensorId`.
#[derive(Debug)]
pub struct TensorStore<T> {
    slots: Vec<Option<T>>,
}

impl<T> TensorStore<T> {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| None).collect(),
        }
    }

    pub fn get(&self, id: TensorId) -> Result<&T, HarnessError> {
        self.slots
            .get(id)
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| HarnessError::Execution(format!("Tensor {} has no value", id)))
    }

    pub fn insert(&mut self, id: TensorId, value: T) -> Result<(), HarnessError> {
        let len = self.slots.len();
        let slot = self.slots.get_mut(id).ok_or_else(|| {
            HarnessError::Execution(format!("Tensor {} out of range ({} slots)", id, len))
        })?;
        *slot = Some(value);
        Ok(())
    }

    pub fn take(&mut self, id: TensorId) -> Result<T, HarnessError> {
        self.slots
            .get_mut(id)
            .and_then(Option::take)
            .ok_or_else(|| HarnessError::Execution(format!("Tensor {} has no value", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_out_of_range_are_execution_errors() {
        let mut store: TensorStore<u8> = TensorStore::new(2);
        assert!(matches!(store.get(0), Err(HarnessError::Execution(_))));
        assert!(store.insert(5, 1).is_err());

        store.insert(1, 7).unwrap();
        assert_eq!(store.get(1).unwrap(), &7);
        assert_eq!(store.take(1).unwrap(), 7);
        assert!(store.take(1).is_err());
    }
}
