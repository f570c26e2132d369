use std::fmt;

use smallvec::SmallVec;
use static_shape_onnx::onnx;

/// Size of a tensor dimension as declared in a graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Literal size.
    Fixed(usize),

    /// Named placeholder whose size is bound at runtime (eg. `"batch"`).
    Symbolic(String),

    /// Neither a size nor a name is declared.
    Unknown,
}

impl Dimension {
    pub fn is_fixed(&self) -> bool {
        matches!(self, Dimension::Fixed(_))
    }

    fn from_proto(dim: &onnx::Dimension) -> Dimension {
        if let Some(value) = dim.dim_value {
            return match usize::try_from(value) {
                Ok(size) => Dimension::Fixed(size),
                Err(_) => Dimension::Unknown,
            };
        }
        match dim.dim_param.as_deref() {
            Some(name) if !name.is_empty() => Dimension::Symbolic(name.to_string()),
            _ => Dimension::Unknown,
        }
    }

    fn to_proto(&self) -> onnx::Dimension {
        let mut dim = onnx::Dimension::default();
        match self {
            // Saturate instead of wrapping to a negative size.
            Dimension::Fixed(size) => {
                dim.dim_value = Some(i64::try_from(*size).unwrap_or(i64::MAX));
            }
            Dimension::Symbolic(name) => dim.dim_param = Some(name.clone()),
            Dimension::Unknown => {}
        }
        dim
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Fixed(size) => write!(f, "{}", size),
            Dimension::Symbolic(name) => write!(f, "{}", name),
            Dimension::Unknown => write!(f, "?"),
        }
    }
}

/// Shape of a tensor as a list of dimensions.
pub type Shape = SmallVec<[Dimension; 4]>;

/// Format a shape as `[d0, d1, ...]`.
pub fn format_shape(shape: &[Dimension]) -> String {
    let dims: Vec<String> = shape.iter().map(|dim| dim.to_string()).collect();
    format!("[{}]", dims.join(", "))
}

/// Element type of a tensor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Float,
    Float16,
    Int32,
    Int64,
    Bool,

    /// Any other ONNX `TensorProto.DataType` value.
    Other(i32),
}

impl ElementType {
    pub fn from_data_type(dtype: onnx::DataType) -> ElementType {
        match dtype {
            onnx::DataType::FLOAT => ElementType::Float,
            onnx::DataType::FLOAT16 => ElementType::Float16,
            onnx::DataType::INT32 => ElementType::Int32,
            onnx::DataType::INT64 => ElementType::Int64,
            onnx::DataType::BOOL => ElementType::Bool,
            onnx::DataType(other) => ElementType::Other(other),
        }
    }

    pub fn to_data_type(self) -> onnx::DataType {
        match self {
            ElementType::Float => onnx::DataType::FLOAT,
            ElementType::Float16 => onnx::DataType::FLOAT16,
            ElementType::Int32 => onnx::DataType::INT32,
            ElementType::Int64 => onnx::DataType::INT64,
            ElementType::Bool => onnx::DataType::BOOL,
            ElementType::Other(other) => onnx::DataType(other),
        }
    }

    /// Return the size of one element in `raw_data`, or `None` if elements of
    /// this type do not have a fixed-size binary representation.
    pub fn size_in_bytes(self) -> Option<usize> {
        match self {
            ElementType::Float | ElementType::Int32 => Some(4),
            ElementType::Float16 => Some(2),
            ElementType::Int64 => Some(8),
            ElementType::Bool => Some(1),
            ElementType::Other(other) => match onnx::DataType(other) {
                onnx::DataType::UINT8 | onnx::DataType::INT8 => Some(1),
                onnx::DataType::DOUBLE => Some(8),
                _ => None,
            },
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Float => write!(f, "float32"),
            ElementType::Float16 => write!(f, "float16"),
            ElementType::Int32 => write!(f, "int32"),
            ElementType::Int64 => write!(f, "int64"),
            ElementType::Bool => write!(f, "bool"),
            ElementType::Other(dtype) => write!(f, "dtype({})", dtype),
        }
    }
}

/// Name, element type and shape of a graph value.
///
/// This wraps an ONNX `ValueInfoProto`. Fields which are not interpreted here,
/// such as doc strings, dimension denotations or non-tensor types, are
/// preserved when the graph is saved.
#[derive(Clone, Debug, PartialEq)]
pub struct TensorInfo {
    name: String,
    proto: onnx::ValueInfoProto,
}

impl TensorInfo {
    /// Create a tensor declaration.
    ///
    /// If `shape` is `None` the tensor has unknown rank.
    pub fn new(name: &str, elem_type: Option<ElementType>, shape: Option<&[Dimension]>) -> Self {
        let mut info = TensorInfo {
            name: name.to_string(),
            proto: onnx::ValueInfoProto::default(),
        };
        if let Some(elem_type) = elem_type {
            info.set_elem_type(elem_type);
        }
        if let Some(shape) = shape {
            info.set_shape(shape);
        }
        info
    }

    /// Wrap a `ValueInfoProto`. Returns `None` if the value has no name.
    pub(crate) fn from_proto(mut proto: onnx::ValueInfoProto) -> Option<Self> {
        let name = proto.name.take().filter(|name| !name.is_empty())?;
        Some(TensorInfo { name, proto })
    }

    pub(crate) fn into_proto(self) -> onnx::ValueInfoProto {
        let mut proto = self.proto;
        proto.name = Some(self.name);
        proto
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn tensor_type(&self) -> Option<&onnx::TypeProtoTensor> {
        self.proto.r#type.as_ref()?.tensor_type.as_ref()
    }

    fn tensor_type_mut(&mut self) -> &mut onnx::TypeProtoTensor {
        self.proto
            .r#type
            .get_or_insert_with(Default::default)
            .tensor_type
            .get_or_insert_with(Default::default)
    }

    /// Return the declared element type, if this is a tensor with a known
    /// type.
    pub fn elem_type(&self) -> Option<ElementType> {
        self.tensor_type()?
            .elem_type
            .filter(|dtype| *dtype != onnx::DataType::UNDEFINED)
            .map(ElementType::from_data_type)
    }

    pub fn set_elem_type(&mut self, elem_type: ElementType) {
        self.tensor_type_mut().elem_type = Some(elem_type.to_data_type());
    }

    /// Return the declared shape, or `None` if the rank is unknown.
    pub fn shape(&self) -> Option<Shape> {
        let shape = self.tensor_type()?.shape.as_ref()?;
        Some(shape.dim.iter().map(Dimension::from_proto).collect())
    }

    /// Replace the declared shape.
    pub fn set_shape(&mut self, dims: &[Dimension]) {
        let shape = self
            .tensor_type_mut()
            .shape
            .get_or_insert_with(Default::default);
        shape.dim = dims.iter().map(Dimension::to_proto).collect();
    }

    /// Return true if the shape is known and every dimension is fixed.
    pub fn is_static(&self) -> bool {
        self.shape()
            .is_some_and(|shape| shape.iter().all(Dimension::is_fixed))
    }

    /// Format the shape for display, eg. `[1, seq_len, ?]`.
    pub fn shape_string(&self) -> String {
        match self.shape() {
            Some(shape) => format_shape(&shape),
            None => "(unknown rank)".to_string(),
        }
    }
}
