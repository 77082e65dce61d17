use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;

/// Dense row-major `f32` array.
///
/// Used for decoded pixel grids (`frames, samples, rows, columns`), model inputs and model
/// outputs alike.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

pub type PixelArray = Tensor;
pub type InferenceTensor = Tensor;

impl Tensor {
    /// Returns `None` when `data` does not hold exactly `product(shape)` values.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Option<Self> {
        (element_count(&shape) == data.len()).then_some(Self { shape, data })
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let data = vec![0.0; element_count(&shape)];
        Self { shape, data }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Parses a rectangular nested JSON array of numbers.
    pub fn from_nested(value: &Value) -> Result<Self, String> {
        let mut shape = Vec::new();
        let mut level = value;
        while let Value::Array(items) = level {
            shape.push(items.len());
            match items.first() {
                Some(first) => level = first,
                None => break,
            }
        }

        let mut data = Vec::with_capacity(element_count(&shape));
        collect_leaves(value, &shape, 0, &mut data)?;
        Ok(Self { shape, data })
    }

    /// Borrowed view that serializes as nested arrays.
    pub fn nested(&self) -> Nested<'_> {
        Nested {
            shape: &self.shape,
            data: &self.data,
        }
    }
}

fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

fn collect_leaves(
    value: &Value,
    shape: &[usize],
    depth: usize,
    out: &mut Vec<f32>,
) -> Result<(), String> {
    match (value, shape.get(depth)) {
        (Value::Array(items), Some(&expected)) => {
            if items.len() != expected {
                return Err(format!(
                    "ragged array at depth {depth}: expected {expected} items, found {}",
                    items.len()
                ));
            }
            for item in items {
                collect_leaves(item, shape, depth + 1, out)?;
            }
            Ok(())
        }
        (Value::Number(number), None) => {
            let value = number
                .as_f64()
                .ok_or_else(|| format!("number {number} is out of range"))?;
            out.push(value as f32);
            Ok(())
        }
        (Value::Array(_), None) | (Value::Number(_), Some(_)) => {
            Err(format!("ragged array: inconsistent nesting at depth {depth}"))
        }
        (other, _) => Err(format!("expected a number at depth {depth}, found {other}")),
    }
}

pub struct Nested<'a> {
    shape: &'a [usize],
    data: &'a [f32],
}

impl Serialize for Nested<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some((&len, inner)) = self.shape.split_first() else {
            return serializer.serialize_f32(self.data[0]);
        };

        let stride = element_count(inner);
        let mut seq = serializer.serialize_seq(Some(len))?;
        for idx in 0..len {
            seq.serialize_element(&Nested {
                shape: inner,
                data: &self.data[idx * stride..(idx + 1) * stride],
            })?;
        }
        seq.end()
    }
}
