//! ONNX model Protocol Buffers types.
//!
//! The types in this module correspond to Protocol Buffers messages defined
//! in [onnx.proto](https://github.com/onnx/onnx/blob/main/onnx/onnx.proto).
//! See the `.proto` file for detailed information on each type and field.
//!
//! Only fields which the shape rewriter reads or writes are exposed as struct
//! fields. Every other field is kept in `unknown_fields` and written back
//! verbatim by [`EncodeMessage`], so decoding and re-encoding a model keeps
//! metadata such as doc strings, training info and local functions.

use crate::protobuf::{
    DecodeMessage, EncodeMessage, Fields, MessageWriter, ProtobufError, UnknownField,
};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct AttributeType(pub i32);

impl AttributeType {
    pub const UNDEFINED: Self = Self(0);
    pub const FLOAT: Self = Self(1);
    pub const INT: Self = Self(2);
    pub const STRING: Self = Self(3);
    pub const TENSOR: Self = Self(4);
    pub const GRAPH: Self = Self(5);
    pub const FLOATS: Self = Self(6);
    pub const INTS: Self = Self(7);
    pub const STRINGS: Self = Self(8);
    pub const TENSORS: Self = Self(9);
    pub const GRAPHS: Self = Self(10);
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeProto {
    pub name: Option<String>,
    pub f: Option<f32>,
    pub i: Option<i64>,
    /// String value. ONNX declares this as `bytes`.
    pub s: Option<Vec<u8>>,
    pub t: Option<TensorProto>,
    pub g: Option<GraphProto>,
    pub floats: Vec<f32>,
    pub ints: Vec<i64>,
    pub strings: Vec<Vec<u8>>,
    pub tensors: Vec<TensorProto>,
    pub graphs: Vec<GraphProto>,
    pub r#type: Option<AttributeType>,
    pub unknown_fields: Vec<UnknownField>,
}

impl AttributeProto {
    const NAME: u64 = 1;
    const F: u64 = 2;
    const I: u64 = 3;
    const S: u64 = 4;
    const T: u64 = 5;
    const G: u64 = 6;
    const FLOATS: u64 = 7;
    const INTS: u64 = 8;
    const STRINGS: u64 = 9;
    const TENSORS: u64 = 10;
    const GRAPHS: u64 = 11;
    const TYPE: u64 = 20;
}

impl DecodeMessage for AttributeProto {
    fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError> {
        let mut msg = Self::default();
        for field in fields {
            let field = field?;
            match field.number() {
                Self::NAME => msg.name = Some(field.read_string()?),
                Self::F => msg.f = Some(field.get_float()?),
                Self::I => msg.i = Some(field.get_int64()?),
                Self::S => msg.s = Some(field.read_bytes()?),
                Self::T => msg.t = Some(field.read_message()?),
                Self::G => msg.g = Some(field.read_message()?),
                Self::FLOATS => {
                    for float in field.read_repeated_float()? {
                        msg.floats.push(float?);
                    }
                }
                Self::INTS => {
                    for int in field.read_repeated_int64()? {
                        msg.ints.push(int?);
                    }
                }
                Self::STRINGS => msg.strings.push(field.read_bytes()?),
                Self::TENSORS => msg.tensors.push(field.read_message()?),
                Self::GRAPHS => msg.graphs.push(field.read_message()?),
                Self::TYPE => msg.r#type = Some(AttributeType(field.get_enum()?)),
                _ => msg.unknown_fields.push(field.into_unknown()),
            }
        }
        Ok(msg)
    }
}

impl EncodeMessage for AttributeProto {
    fn encode_fields(&self, writer: &mut MessageWriter) {
        if let Some(name) = &self.name {
            writer.write_string(Self::NAME, name);
        }
        if let Some(f) = self.f {
            writer.write_float(Self::F, f);
        }
        if let Some(i) = self.i {
            writer.write_int64(Self::I, i);
        }
        if let Some(s) = &self.s {
            writer.write_bytes(Self::S, s);
        }
        if let Some(t) = &self.t {
            writer.write_message(Self::T, t);
        }
        if let Some(g) = &self.g {
            writer.write_message(Self::G, g);
        }
        writer.write_unpacked_float(Self::FLOATS, &self.floats);
        writer.write_unpacked_int64(Self::INTS, &self.ints);
        for s in &self.strings {
            writer.write_bytes(Self::STRINGS, s);
        }
        writer.write_messages(Self::TENSORS, &self.tensors);
        writer.write_messages(Self::GRAPHS, &self.graphs);
        if let Some(attr_type) = self.r#type {
            writer.write_int32(Self::TYPE, attr_type.0);
        }
        writer.write_unknown(&self.unknown_fields);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeProto {
    pub input: Vec<String>,
    pub output: Vec<String>,
    pub name: Option<String>,
    pub op_type: Option<String>,
    pub attribute: Vec<AttributeProto>,
    pub doc_string: Option<String>,
    pub domain: Option<String>,
    pub unknown_fields: Vec<UnknownField>,
}

impl NodeProto {
    const INPUT: u64 = 1;
    const OUTPUT: u64 = 2;
    const NAME: u64 = 3;
    const OP_TYPE: u64 = 4;
    const ATTRIBUTE: u64 = 5;
    const DOC_STRING: u64 = 6;
    const DOMAIN: u64 = 7;
}

impl DecodeMessage for NodeProto {
    fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError> {
        let mut msg = Self::default();
        for field in fields {
            let field = field?;
            match field.number() {
                Self::INPUT => msg.input.push(field.read_string()?),
                Self::OUTPUT => msg.output.push(field.read_string()?),
                Self::NAME => msg.name = Some(field.read_string()?),
                Self::OP_TYPE => msg.op_type = Some(field.read_string()?),
                Self::ATTRIBUTE => msg.attribute.push(field.read_message()?),
                Self::DOC_STRING => msg.doc_string = Some(field.read_string()?),
                Self::DOMAIN => msg.domain = Some(field.read_string()?),
                _ => msg.unknown_fields.push(field.into_unknown()),
            }
        }
        Ok(msg)
    }
}

impl EncodeMessage for NodeProto {
    fn encode_fields(&self, writer: &mut MessageWriter) {
        writer.write_strings(Self::INPUT, &self.input);
        writer.write_strings(Self::OUTPUT, &self.output);
        if let Some(name) = &self.name {
            writer.write_string(Self::NAME, name);
        }
        if let Some(op_type) = &self.op_type {
            writer.write_string(Self::OP_TYPE, op_type);
        }
        writer.write_messages(Self::ATTRIBUTE, &self.attribute);
        if let Some(doc_string) = &self.doc_string {
            writer.write_string(Self::DOC_STRING, doc_string);
        }
        if let Some(domain) = &self.domain {
            writer.write_string(Self::DOMAIN, domain);
        }
        writer.write_unknown(&self.unknown_fields);
    }
}

#[derive(Clone, Default, PartialEq)]
pub struct TensorProto {
    pub dims: Vec<i64>,
    pub data_type: Option<DataType>,
    pub float_data: Vec<f32>,
    pub int32_data: Vec<i32>,
    pub int64_data: Vec<i64>,
    pub name: Option<String>,

    /// Field containing tensor data as bytes in packed little-endian order.
    ///
    /// This is the field most often used to store data for large tensors.
    pub raw_data: Option<Vec<u8>>,

    pub double_data: Vec<f64>,
    pub uint64_data: Vec<u64>,
    pub external_data: Vec<StringStringEntryProto>,
    pub data_location: Option<DataLocation>,
    pub unknown_fields: Vec<UnknownField>,
}

impl TensorProto {
    const DIMS: u64 = 1;
    const DATA_TYPE: u64 = 2;
    const FLOAT_DATA: u64 = 4;
    const INT32_DATA: u64 = 5;
    const INT64_DATA: u64 = 7;
    const NAME: u64 = 8;
    const RAW_DATA: u64 = 9;
    const DOUBLE_DATA: u64 = 10;
    const UINT64_DATA: u64 = 11;
    const EXTERNAL_DATA: u64 = 13;
    const DATA_LOCATION: u64 = 14;
}

impl std::fmt::Debug for TensorProto {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("TensorProto")
            .field("dims", &self.dims)
            .field("data_type", &self.data_type)
            .field("name", &self.name)
            .field("data_location", &self.data_location)
            .finish()
    }
}

impl DecodeMessage for TensorProto {
    fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError> {
        let mut msg = TensorProto::default();
        for field in fields {
            let field = field?;
            match field.number() {
                Self::DIMS => {
                    for dim in field.read_repeated_int64()? {
                        msg.dims.push(dim?);
                    }
                }
                Self::DATA_TYPE => msg.data_type = Some(DataType(field.get_enum()?)),
                Self::FLOAT_DATA => {
                    for float in field.read_repeated_float()? {
                        msg.float_data.push(float?);
                    }
                }
                Self::INT32_DATA => {
                    for int32 in field.read_repeated_int32()? {
                        msg.int32_data.push(int32?);
                    }
                }
                Self::INT64_DATA => {
                    for int64 in field.read_repeated_int64()? {
                        msg.int64_data.push(int64?);
                    }
                }
                Self::NAME => msg.name = Some(field.read_string()?),
                Self::RAW_DATA => msg.raw_data = Some(field.read_bytes()?),
                Self::DOUBLE_DATA => {
                    for double in field.read_repeated_double()? {
                        msg.double_data.push(double?);
                    }
                }
                Self::UINT64_DATA => {
                    for uint64 in field.read_repeated_uint64()? {
                        msg.uint64_data.push(uint64?);
                    }
                }
                Self::EXTERNAL_DATA => msg.external_data.push(field.read_message()?),
                Self::DATA_LOCATION => {
                    msg.data_location = Some(DataLocation(field.get_enum()?));
                }
                _ => msg.unknown_fields.push(field.into_unknown()),
            }
        }
        Ok(msg)
    }
}

impl EncodeMessage for TensorProto {
    fn encode_fields(&self, writer: &mut MessageWriter) {
        writer.write_unpacked_int64(Self::DIMS, &self.dims);
        if let Some(data_type) = self.data_type {
            writer.write_int32(Self::DATA_TYPE, data_type.0);
        }
        writer.write_packed_float(Self::FLOAT_DATA, &self.float_data);
        writer.write_packed_int32(Self::INT32_DATA, &self.int32_data);
        writer.write_packed_int64(Self::INT64_DATA, &self.int64_data);
        if let Some(name) = &self.name {
            writer.write_string(Self::NAME, name);
        }
        if let Some(raw_data) = &self.raw_data {
            writer.write_bytes(Self::RAW_DATA, raw_data);
        }
        writer.write_packed_double(Self::DOUBLE_DATA, &self.double_data);
        writer.write_packed_uint64(Self::UINT64_DATA, &self.uint64_data);
        writer.write_messages(Self::EXTERNAL_DATA, &self.external_data);
        if let Some(location) = self.data_location {
            writer.write_int32(Self::DATA_LOCATION, location.0);
        }
        writer.write_unknown(&self.unknown_fields);
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DataLocation(pub i32);

impl DataLocation {
    pub const DEFAULT: Self = Self(0);
    pub const EXTERNAL: Self = Self(1);
}

/// Element type of a tensor (`TensorProto.DataType`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct DataType(pub i32);

impl DataType {
    pub const UNDEFINED: Self = Self(0);
    pub const FLOAT: Self = Self(1);
    pub const UINT8: Self = Self(2);
    pub const INT8: Self = Self(3);
    pub const INT32: Self = Self(6);
    pub const INT64: Self = Self(7);
    pub const STRING: Self = Self(8);
    pub const BOOL: Self = Self(9);
    pub const FLOAT16: Self = Self(10);
    pub const DOUBLE: Self = Self(11);
}

/// A single dimension of a [`TensorShapeProto`].
///
/// At most one of `dim_value` and `dim_param` is set. If neither is set, the
/// dimension's size is unknown.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dimension {
    pub dim_value: Option<i64>,
    pub dim_param: Option<String>,
    pub unknown_fields: Vec<UnknownField>,
}

impl Dimension {
    const DIM_VALUE: u64 = 1;
    const DIM_PARAM: u64 = 2;
}

impl DecodeMessage for Dimension {
    fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError> {
        let mut msg = Self::default();
        for field in fields {
            let field = field?;
            match field.number() {
                Self::DIM_VALUE => msg.dim_value = Some(field.get_int64()?),
                Self::DIM_PARAM => msg.dim_param = Some(field.read_string()?),
                _ => msg.unknown_fields.push(field.into_unknown()),
            }
        }
        Ok(msg)
    }
}

impl EncodeMessage for Dimension {
    fn encode_fields(&self, writer: &mut MessageWriter) {
        if let Some(value) = self.dim_value {
            writer.write_int64(Self::DIM_VALUE, value);
        }
        if let Some(param) = &self.dim_param {
            writer.write_string(Self::DIM_PARAM, param);
        }
        writer.write_unknown(&self.unknown_fields);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StringStringEntryProto {
    pub key: Option<String>,
    pub value: Option<String>,
    pub unknown_fields: Vec<UnknownField>,
}

impl StringStringEntryProto {
    const KEY: u64 = 1;
    const VALUE: u64 = 2;
}

impl DecodeMessage for StringStringEntryProto {
    fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError> {
        let mut msg = Self::default();
        for field in fields {
            let field = field?;
            match field.number() {
                Self::KEY => msg.key = Some(field.read_string()?),
                Self::VALUE => msg.value = Some(field.read_string()?),
                _ => msg.unknown_fields.push(field.into_unknown()),
            }
        }
        Ok(msg)
    }
}

impl EncodeMessage for StringStringEntryProto {
    fn encode_fields(&self, writer: &mut MessageWriter) {
        if let Some(key) = &self.key {
            writer.write_string(Self::KEY, key);
        }
        if let Some(value) = &self.value {
            writer.write_string(Self::VALUE, value);
        }
        writer.write_unknown(&self.unknown_fields);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TensorShapeProto {
    pub dim: Vec<Dimension>,
    pub unknown_fields: Vec<UnknownField>,
}

impl TensorShapeProto {
    const DIM: u64 = 1;
}

impl DecodeMessage for TensorShapeProto {
    fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError> {
        let mut msg = Self::default();
        for field in fields {
            let field = field?;
            match field.number() {
                Self::DIM => msg.dim.push(field.read_message()?),
                _ => msg.unknown_fields.push(field.into_unknown()),
            }
        }
        Ok(msg)
    }
}

impl EncodeMessage for TensorShapeProto {
    fn encode_fields(&self, writer: &mut MessageWriter) {
        writer.write_messages(Self::DIM, &self.dim);
        writer.write_unknown(&self.unknown_fields);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeProtoTensor {
    pub elem_type: Option<DataType>,
    pub shape: Option<TensorShapeProto>,
    pub unknown_fields: Vec<UnknownField>,
}

impl TypeProtoTensor {
    const ELEM_TYPE: u64 = 1; // DataType
    const SHAPE: u64 = 2; // TensorShapeProto
}

impl DecodeMessage for TypeProtoTensor {
    fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError> {
        let mut msg = Self::default();
        for field in fields {
            let field = field?;
            match field.number() {
                Self::ELEM_TYPE => msg.elem_type = Some(DataType(field.get_enum()?)),
                Self::SHAPE => msg.shape = Some(field.read_message()?),
                _ => msg.unknown_fields.push(field.into_unknown()),
            }
        }
        Ok(msg)
    }
}

impl EncodeMessage for TypeProtoTensor {
    fn encode_fields(&self, writer: &mut MessageWriter) {
        if let Some(elem_type) = self.elem_type {
            writer.write_int32(Self::ELEM_TYPE, elem_type.0);
        }
        if let Some(shape) = &self.shape {
            writer.write_message(Self::SHAPE, shape);
        }
        writer.write_unknown(&self.unknown_fields);
    }
}

/// Type of a value. Only the tensor variant is interpreted. Sequence, map,
/// optional and sparse tensor types are kept as unknown fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeProto {
    pub tensor_type: Option<TypeProtoTensor>,
    pub unknown_fields: Vec<UnknownField>,
}

impl TypeProto {
    const TENSOR_TYPE: u64 = 1;
}

impl DecodeMessage for TypeProto {
    fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError> {
        let mut msg = Self::default();
        for field in fields {
            let field = field?;
            match field.number() {
                Self::TENSOR_TYPE => msg.tensor_type = Some(field.read_message()?),
                _ => msg.unknown_fields.push(field.into_unknown()),
            }
        }
        Ok(msg)
    }
}

impl EncodeMessage for TypeProto {
    fn encode_fields(&self, writer: &mut MessageWriter) {
        if let Some(tensor_type) = &self.tensor_type {
            writer.write_message(Self::TENSOR_TYPE, tensor_type);
        }
        writer.write_unknown(&self.unknown_fields);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueInfoProto {
    pub name: Option<String>,
    pub r#type: Option<TypeProto>,
    pub doc_string: Option<String>,
    pub unknown_fields: Vec<UnknownField>,
}

impl ValueInfoProto {
    const NAME: u64 = 1;
    const TYPE: u64 = 2;
    const DOC_STRING: u64 = 3;
}

impl DecodeMessage for ValueInfoProto {
    fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError> {
        let mut msg = Self::default();
        for field in fields {
            let field = field?;
            match field.number() {
                Self::NAME => msg.name = Some(field.read_string()?),
                Self::TYPE => msg.r#type = Some(field.read_message()?),
                Self::DOC_STRING => msg.doc_string = Some(field.read_string()?),
                _ => msg.unknown_fields.push(field.into_unknown()),
            }
        }
        Ok(msg)
    }
}

impl EncodeMessage for ValueInfoProto {
    fn encode_fields(&self, writer: &mut MessageWriter) {
        if let Some(name) = &self.name {
            writer.write_string(Self::NAME, name);
        }
        if let Some(value_type) = &self.r#type {
            writer.write_message(Self::TYPE, value_type);
        }
        if let Some(doc_string) = &self.doc_string {
            writer.write_string(Self::DOC_STRING, doc_string);
        }
        writer.write_unknown(&self.unknown_fields);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphProto {
    pub node: Vec<NodeProto>,
    pub name: Option<String>,
    pub initializer: Vec<TensorProto>,
    pub doc_string: Option<String>,
    pub input: Vec<ValueInfoProto>,
    pub output: Vec<ValueInfoProto>,
    pub value_info: Vec<ValueInfoProto>,
    pub unknown_fields: Vec<UnknownField>,
}

impl GraphProto {
    const NODE: u64 = 1;
    const NAME: u64 = 2;
    const INITIALIZER: u64 = 5;
    const DOC_STRING: u64 = 10;
    const INPUT: u64 = 11;
    const OUTPUT: u64 = 12;
    const VALUE_INFO: u64 = 13;
}

impl DecodeMessage for GraphProto {
    fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError> {
        let mut msg = Self::default();
        for field in fields {
            let field = field?;
            match field.number() {
                Self::NODE => msg.node.push(field.read_message()?),
                Self::NAME => msg.name = Some(field.read_string()?),
                Self::INITIALIZER => msg.initializer.push(field.read_message()?),
                Self::DOC_STRING => msg.doc_string = Some(field.read_string()?),
                Self::INPUT => msg.input.push(field.read_message()?),
                Self::OUTPUT => msg.output.push(field.read_message()?),
                Self::VALUE_INFO => msg.value_info.push(field.read_message()?),
                _ => msg.unknown_fields.push(field.into_unknown()),
            }
        }
        Ok(msg)
    }
}

impl EncodeMessage for GraphProto {
    fn encode_fields(&self, writer: &mut MessageWriter) {
        writer.write_messages(Self::NODE, &self.node);
        if let Some(name) = &self.name {
            writer.write_string(Self::NAME, name);
        }
        writer.write_messages(Self::INITIALIZER, &self.initializer);
        if let Some(doc_string) = &self.doc_string {
            writer.write_string(Self::DOC_STRING, doc_string);
        }
        writer.write_messages(Self::INPUT, &self.input);
        writer.write_messages(Self::OUTPUT, &self.output);
        writer.write_messages(Self::VALUE_INFO, &self.value_info);
        writer.write_unknown(&self.unknown_fields);
    }
}

/// Operator set version imported by a model (eg. `ai.onnx` version 17).
///
/// An empty or absent domain refers to the default `ai.onnx` operator set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OperatorSetIdProto {
    pub domain: Option<String>,
    pub version: Option<i64>,
    pub unknown_fields: Vec<UnknownField>,
}

impl OperatorSetIdProto {
    const DOMAIN: u64 = 1;
    const VERSION: u64 = 2;
}

impl DecodeMessage for OperatorSetIdProto {
    fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError> {
        let mut msg = Self::default();
        for field in fields {
            let field = field?;
            match field.number() {
                Self::DOMAIN => msg.domain = Some(field.read_string()?),
                Self::VERSION => msg.version = Some(field.get_int64()?),
                _ => msg.unknown_fields.push(field.into_unknown()),
            }
        }
        Ok(msg)
    }
}

impl EncodeMessage for OperatorSetIdProto {
    fn encode_fields(&self, writer: &mut MessageWriter) {
        if let Some(domain) = &self.domain {
            writer.write_string(Self::DOMAIN, domain);
        }
        if let Some(version) = self.version {
            writer.write_int64(Self::VERSION, version);
        }
        writer.write_unknown(&self.unknown_fields);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelProto {
    pub ir_version: Option<i64>,
    pub producer_name: Option<String>,
    pub producer_version: Option<String>,
    pub domain: Option<String>,
    pub model_version: Option<i64>,
    pub doc_string: Option<String>,
    pub graph: Option<GraphProto>,
    pub opset_import: Vec<OperatorSetIdProto>,
    pub metadata_props: Vec<StringStringEntryProto>,
    pub unknown_fields: Vec<UnknownField>,
}

impl ModelProto {
    const IR_VERSION: u64 = 1;
    const PRODUCER_NAME: u64 = 2;
    const PRODUCER_VERSION: u64 = 3;
    const DOMAIN: u64 = 4;
    const MODEL_VERSION: u64 = 5;
    const DOC_STRING: u64 = 6;
    const GRAPH: u64 = 7;
    const OPSET_IMPORT: u64 = 8;
    const METADATA_PROPS: u64 = 14;
}

impl DecodeMessage for ModelProto {
    fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError> {
        let mut msg = Self::default();
        for field in fields {
            let field = field?;
            match field.number() {
                Self::IR_VERSION => msg.ir_version = Some(field.get_int64()?),
                Self::PRODUCER_NAME => msg.producer_name = Some(field.read_string()?),
                Self::PRODUCER_VERSION => msg.producer_version = Some(field.read_string()?),
                Self::DOMAIN => msg.domain = Some(field.read_string()?),
                Self::MODEL_VERSION => msg.model_version = Some(field.get_int64()?),
                Self::DOC_STRING => msg.doc_string = Some(field.read_string()?),
                Self::GRAPH => msg.graph = Some(field.read_message()?),
                Self::OPSET_IMPORT => msg.opset_import.push(field.read_message()?),
                Self::METADATA_PROPS => msg.metadata_props.push(field.read_message()?),
                _ => msg.unknown_fields.push(field.into_unknown()),
            }
        }
        Ok(msg)
    }
}

impl EncodeMessage for ModelProto {
    fn encode_fields(&self, writer: &mut MessageWriter) {
        if let Some(ir_version) = self.ir_version {
            writer.write_int64(Self::IR_VERSION, ir_version);
        }
        if let Some(name) = &self.producer_name {
            writer.write_string(Self::PRODUCER_NAME, name);
        }
        if let Some(version) = &self.producer_version {
            writer.write_string(Self::PRODUCER_VERSION, version);
        }
        if let Some(domain) = &self.domain {
            writer.write_string(Self::DOMAIN, domain);
        }
        if let Some(version) = self.model_version {
            writer.write_int64(Self::MODEL_VERSION, version);
        }
        if let Some(doc_string) = &self.doc_string {
            writer.write_string(Self::DOC_STRING, doc_string);
        }
        if let Some(graph) = &self.graph {
            writer.write_message(Self::GRAPH, graph);
        }
        writer.write_messages(Self::OPSET_IMPORT, &self.opset_import);
        writer.write_messages(Self::METADATA_PROPS, &self.metadata_props);
        writer.write_unknown(&self.unknown_fields);
    }
}

/// Simplified version of [`ModelProto`] used for file type detection.
#[derive(Debug, Default)]
struct SlimModelProto {
    ir_version: Option<i64>,
    graph: bool,
}

impl DecodeMessage for SlimModelProto {
    fn decode_fields(fields: Fields<'_>) -> Result<Self, ProtobufError> {
        let mut msg = Self::default();
        for field in fields {
            let field = field?;
            match field.number() {
                ModelProto::IR_VERSION => msg.ir_version = Some(field.get_int64()?),
                ModelProto::GRAPH => {
                    // Only check the wire type. The graph itself is not decoded.
                    msg.graph = matches!(field.value(), crate::protobuf::FieldValue::Len(_));
                }
                _ => {}
            }
        }
        Ok(msg)
    }
}

/// Test whether a buffer contains an ONNX model.
///
/// ONNX models do not contain any magic bytes that would make detection simple.
/// Instead this function attempts to parse the data as a simplified version of
/// the `ModelProto` message type, testing for the presence of a few key fields
/// but skipping over the main graph.
///
/// ```
/// use static_shape_onnx::onnx::is_onnx_model;
///
/// assert!(!is_onnx_model(b"NOT AN ONNX MODEL"));
/// ```
pub fn is_onnx_model(buf: &[u8]) -> bool {
    let Ok(model) = SlimModelProto::decode(buf) else {
        return false;
    };
    // The `ir_version` field is required, and a model without a graph is not
    // useful.
    model.ir_version.is_some() && model.graph
}
