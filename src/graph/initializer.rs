use static_shape_onnx::onnx;

use super::value_info::ElementType;

/// A named constant tensor stored in the graph.
///
/// The tensor data is kept in whatever form the model file used
/// (`raw_data`, typed `*_data` fields or external data) and is written back
/// unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct Initializer {
    name: String,
    proto: onnx::TensorProto,
}

impl Initializer {
    /// Create a 1D tensor of `len` zeros.
    ///
    /// Returns `None` if `elem_type` has no fixed-size binary representation,
    /// or if the size of the tensor overflows.
    pub fn zeros(name: &str, elem_type: ElementType, len: usize) -> Option<Initializer> {
        let byte_len = elem_type.size_in_bytes()?.checked_mul(len)?;
        let proto = onnx::TensorProto {
            dims: vec![i64::try_from(len).ok()?],
            data_type: Some(elem_type.to_data_type()),
            raw_data: Some(vec![0; byte_len]),
            ..Default::default()
        };
        Some(Initializer {
            name: name.to_string(),
            proto,
        })
    }

    /// Create a 1D `int64` tensor.
    pub fn from_i64s(name: &str, values: &[i64]) -> Initializer {
        let proto = onnx::TensorProto {
            dims: vec![values.len() as i64],
            data_type: Some(onnx::DataType::INT64),
            int64_data: values.to_vec(),
            ..Default::default()
        };
        Initializer {
            name: name.to_string(),
            proto,
        }
    }

    /// Wrap a `TensorProto`. Returns `None` if the tensor has no name.
    pub(crate) fn from_proto(mut proto: onnx::TensorProto) -> Option<Initializer> {
        let name = proto.name.take().filter(|name| !name.is_empty())?;
        Some(Initializer { name, proto })
    }

    pub(crate) fn into_proto(self) -> onnx::TensorProto {
        let mut proto = self.proto;
        proto.name = Some(self.name);
        proto
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> &[i64] {
        &self.proto.dims
    }

    pub fn elem_type(&self) -> Option<ElementType> {
        self.proto.data_type.map(ElementType::from_data_type)
    }

    /// Return the underlying tensor message.
    pub fn proto(&self) -> &onnx::TensorProto {
        &self.proto
    }
}
