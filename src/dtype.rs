#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    I8,
    Char,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl DataType {
    /// Size in bytes of one element.
    pub const fn byte_width(&self) -> usize {
        match self {
            DataType::I8 | DataType::Char | DataType::U8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::I32 | DataType::U32 | DataType::F32 => 4,
            DataType::I64 | DataType::U64 | DataType::F64 => 8,
        }
    }

    /// Whether variables of this type can be copied by the extractor.
    ///
    /// Only the classic kinds (byte, char, short, int, float, double) are extractable.
    pub const fn is_extractable(&self) -> bool {
        matches!(
            self,
            DataType::I8
                | DataType::Char
                | DataType::I16
                | DataType::I32
                | DataType::F32
                | DataType::F64
        )
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataType::I8 => "byte",
            DataType::Char => "char",
            DataType::I16 => "short",
            DataType::I32 => "int",
            DataType::I64 => "int64",
            DataType::U8 => "ubyte",
            DataType::U16 => "ushort",
            DataType::U32 => "uint",
            DataType::U64 => "uint64",
            DataType::F32 => "float",
            DataType::F64 => "double",
        };
        f.write_str(name)
    }
}
