//! A test-only in-memory format: values are encoded into a flat token
//! stream and decoded back from it.
//!
//! The format is deliberately pedantic — it records the not-null mark,
//! element keys and structure boundaries — so tests can assert the exact
//! protocol traffic. Decoding supports both disciplines: the indexed
//! loop (with unknown keys skipped) and, when enabled, sequential
//! replay.

use std::sync::Arc;

use crate::codec::{Codec, Described, DeserializeStrategy, SerializeStrategy};
use crate::descriptor::{
    Annotations, EncodeDefault, SerialDescriptor, build_class_serial_descriptor,
};
use crate::encoding::{
    CompositeDecoder, CompositeEncoder, DecodeSlot, Decoder, ElementIndex, Encodable, Encoder,
    Scalar, Slot, encodable,
};
use crate::error::{SerialError, SerialResult};
use crate::modules::SerializersModule;

// -----------------------------------------------------------------------------
// Token

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Value(Scalar),
    Null,
    Mark,
    Begin(String),
    End,
    Key(String),
}

// -----------------------------------------------------------------------------
// TokenEncoder

pub(crate) struct TokenEncoder {
    pub(crate) tokens: Vec<Token>,
    module: SerializersModule,
    encode_defaults: bool,
}

impl TokenEncoder {
    pub(crate) fn new() -> Self {
        Self {
            tokens: Vec::new(),
            module: SerializersModule::default(),
            encode_defaults: true,
        }
    }

    pub(crate) fn with_module(module: SerializersModule) -> Self {
        Self {
            tokens: Vec::new(),
            module,
            encode_defaults: true,
        }
    }

    pub(crate) fn skip_defaults(mut self) -> Self {
        self.encode_defaults = false;
        self
    }

    fn key_for(descriptor: &SerialDescriptor, index: usize) -> String {
        if descriptor.kind().is_collection() {
            index.to_string()
        } else {
            descriptor.element_name(index).to_owned()
        }
    }

    fn push_key(&mut self, descriptor: &SerialDescriptor, index: usize) {
        self.tokens.push(Token::Key(Self::key_for(descriptor, index)));
    }
}

impl Encoder for TokenEncoder {
    fn serializers_module(&self) -> &SerializersModule {
        &self.module
    }

    fn encode_bool(&mut self, value: bool) -> SerialResult<()> {
        self.tokens.push(Token::Value(Scalar::Bool(value)));
        Ok(())
    }

    fn encode_i8(&mut self, value: i8) -> SerialResult<()> {
        self.tokens.push(Token::Value(Scalar::I8(value)));
        Ok(())
    }

    fn encode_i16(&mut self, value: i16) -> SerialResult<()> {
        self.tokens.push(Token::Value(Scalar::I16(value)));
        Ok(())
    }

    fn encode_i32(&mut self, value: i32) -> SerialResult<()> {
        self.tokens.push(Token::Value(Scalar::I32(value)));
        Ok(())
    }

    fn encode_i64(&mut self, value: i64) -> SerialResult<()> {
        self.tokens.push(Token::Value(Scalar::I64(value)));
        Ok(())
    }

    fn encode_f32(&mut self, value: f32) -> SerialResult<()> {
        self.tokens.push(Token::Value(Scalar::F32(value)));
        Ok(())
    }

    fn encode_f64(&mut self, value: f64) -> SerialResult<()> {
        self.tokens.push(Token::Value(Scalar::F64(value)));
        Ok(())
    }

    fn encode_char(&mut self, value: char) -> SerialResult<()> {
        self.tokens.push(Token::Value(Scalar::Char(value)));
        Ok(())
    }

    fn encode_str(&mut self, value: &str) -> SerialResult<()> {
        self.tokens
            .push(Token::Value(Scalar::String(value.to_owned())));
        Ok(())
    }

    fn encode_enum(&mut self, _descriptor: &SerialDescriptor, ordinal: usize) -> SerialResult<()> {
        self.tokens.push(Token::Value(Scalar::I32(ordinal as i32)));
        Ok(())
    }

    fn encode_null(&mut self) -> SerialResult<()> {
        self.tokens.push(Token::Null);
        Ok(())
    }

    fn encode_not_null_mark(&mut self) -> SerialResult<()> {
        self.tokens.push(Token::Mark);
        Ok(())
    }

    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> SerialResult<&mut dyn CompositeEncoder> {
        self.tokens
            .push(Token::Begin(descriptor.serial_name().to_owned()));
        Ok(self)
    }
}

macro_rules! token_encode_element {
    ($($method:ident => $typed:ident: $ty:ty,)*) => {
        $(
            fn $method(
                &mut self,
                descriptor: &SerialDescriptor,
                index: usize,
                value: $ty,
            ) -> SerialResult<()> {
                self.push_key(descriptor, index);
                self.$typed(value)
            }
        )*
    };
}

impl CompositeEncoder for TokenEncoder {
    fn serializers_module(&self) -> &SerializersModule {
        &self.module
    }

    token_encode_element! {
        encode_bool_element => encode_bool: bool,
        encode_i8_element => encode_i8: i8,
        encode_i16_element => encode_i16: i16,
        encode_i32_element => encode_i32: i32,
        encode_i64_element => encode_i64: i64,
        encode_f32_element => encode_f32: f32,
        encode_f64_element => encode_f64: f64,
        encode_char_element => encode_char: char,
        encode_str_element => encode_str: &str,
    }

    fn encode_serializable_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: &dyn Encodable,
    ) -> SerialResult<()> {
        self.push_key(descriptor, index);
        value.encode(self)
    }

    fn encode_nullable_serializable_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: Option<&dyn Encodable>,
    ) -> SerialResult<()> {
        self.push_key(descriptor, index);
        match value {
            Some(value) => {
                self.encode_not_null_mark()?;
                value.encode(self)
            }
            None => self.encode_null(),
        }
    }

    fn should_encode_element_default(
        &self,
        _descriptor: &SerialDescriptor,
        _index: usize,
    ) -> bool {
        self.encode_defaults
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> SerialResult<()> {
        self.tokens.push(Token::End);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// TokenDecoder

pub(crate) struct TokenDecoder {
    tokens: Vec<Token>,
    pos: usize,
    module: SerializersModule,
    sequential: bool,
}

impl TokenDecoder {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            module: SerializersModule::default(),
            sequential: false,
        }
    }

    pub(crate) fn with_module(tokens: Vec<Token>, module: SerializersModule) -> Self {
        Self {
            tokens,
            pos: 0,
            module,
            sequential: false,
        }
    }

    pub(crate) fn sequentially(mut self) -> Self {
        self.sequential = true;
        self
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next_token(&mut self) -> SerialResult<Token> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| SerialError::custom("unexpected end of token stream"))?;
        self.pos += 1;
        Ok(token)
    }

    fn next_scalar(&mut self) -> SerialResult<Scalar> {
        match self.next_token()? {
            Token::Value(scalar) => Ok(scalar),
            other => Err(SerialError::custom(format!(
                "expected a value token, found {other:?}",
            ))),
        }
    }

    fn consume_key(&mut self) {
        if matches!(self.peek(), Some(Token::Key(_))) {
            self.pos += 1;
        }
    }

    /// Skips one complete value: a scalar, a null, a marked payload or a
    /// balanced `Begin`..`End` range.
    fn skip_value(&mut self) -> SerialResult<()> {
        match self.next_token()? {
            Token::Value(_) | Token::Null => Ok(()),
            Token::Mark | Token::Key(_) => self.skip_value(),
            Token::Begin(_) => {
                let mut depth = 1usize;
                while depth > 0 {
                    match self.next_token()? {
                        Token::Begin(_) => depth += 1,
                        Token::End => depth -= 1,
                        _ => {}
                    }
                }
                Ok(())
            }
            Token::End => Err(SerialError::custom("cannot skip past the end of a structure")),
        }
    }
}

macro_rules! token_scalar {
    ($self:ident, $variant:ident, $expected:literal) => {
        match $self.next_scalar()? {
            Scalar::$variant(value) => Ok(value),
            other => Err(SerialError::TypeMismatch {
                expected: $expected.into(),
                found: other.kind_name().into(),
            }),
        }
    };
}

impl Decoder for TokenDecoder {
    fn serializers_module(&self) -> &SerializersModule {
        &self.module
    }

    fn decode_bool(&mut self) -> SerialResult<bool> {
        token_scalar!(self, Bool, "Bool")
    }

    fn decode_i8(&mut self) -> SerialResult<i8> {
        token_scalar!(self, I8, "I8")
    }

    fn decode_i16(&mut self) -> SerialResult<i16> {
        token_scalar!(self, I16, "I16")
    }

    fn decode_i32(&mut self) -> SerialResult<i32> {
        token_scalar!(self, I32, "I32")
    }

    fn decode_i64(&mut self) -> SerialResult<i64> {
        token_scalar!(self, I64, "I64")
    }

    fn decode_f32(&mut self) -> SerialResult<f32> {
        token_scalar!(self, F32, "F32")
    }

    fn decode_f64(&mut self) -> SerialResult<f64> {
        token_scalar!(self, F64, "F64")
    }

    fn decode_char(&mut self) -> SerialResult<char> {
        token_scalar!(self, Char, "Char")
    }

    fn decode_string(&mut self) -> SerialResult<String> {
        token_scalar!(self, String, "String")
    }

    fn decode_enum(&mut self, _descriptor: &SerialDescriptor) -> SerialResult<usize> {
        Ok(token_scalar!(self, I32, "I32")? as usize)
    }

    fn decode_not_null_mark(&mut self) -> SerialResult<bool> {
        match self.peek() {
            Some(Token::Mark) => {
                self.pos += 1;
                Ok(true)
            }
            Some(Token::Null) => Ok(false),
            _ => Ok(true),
        }
    }

    fn decode_null(&mut self) -> SerialResult<()> {
        match self.next_token()? {
            Token::Null => Ok(()),
            other => Err(SerialError::custom(format!(
                "expected a null token, found {other:?}",
            ))),
        }
    }

    fn begin_structure(
        &mut self,
        _descriptor: &SerialDescriptor,
    ) -> SerialResult<&mut dyn CompositeDecoder> {
        match self.next_token()? {
            Token::Begin(_) => Ok(self),
            other => Err(SerialError::custom(format!(
                "expected a structure, found {other:?}",
            ))),
        }
    }
}

macro_rules! token_decode_element {
    ($($method:ident => $typed:ident: $ty:ty,)*) => {
        $(
            fn $method(
                &mut self,
                _descriptor: &SerialDescriptor,
                _index: usize,
            ) -> SerialResult<$ty> {
                self.consume_key();
                self.$typed()
            }
        )*
    };
}

impl CompositeDecoder for TokenDecoder {
    fn serializers_module(&self) -> &SerializersModule {
        &self.module
    }

    fn decode_element_index(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> SerialResult<ElementIndex> {
        match self.peek() {
            Some(Token::End) => Ok(ElementIndex::Done),
            Some(Token::Key(name)) => {
                if descriptor.kind().is_collection() {
                    let index = name.parse::<usize>().map_err(|_| {
                        SerialError::custom(format!("invalid collection key `{name}`"))
                    })?;
                    self.pos += 1;
                    Ok(ElementIndex::Index(index))
                } else {
                    match descriptor.element_index(name) {
                        Some(index) => {
                            self.pos += 1;
                            Ok(ElementIndex::Index(index))
                        }
                        None => {
                            // Unknown-field policy: skip and report.
                            self.pos += 1;
                            self.skip_value()?;
                            Ok(ElementIndex::Unknown)
                        }
                    }
                }
            }
            Some(other) => Err(SerialError::custom(format!(
                "expected an element key, found {other:?}",
            ))),
            None => Err(SerialError::custom("unexpected end of token stream")),
        }
    }

    fn decode_sequentially(&self) -> bool {
        self.sequential
    }

    fn decode_collection_size(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> SerialResult<Option<usize>> {
        let mut depth = 0usize;
        let mut keys = 0usize;
        for token in &self.tokens[self.pos..] {
            match token {
                Token::Begin(_) => depth += 1,
                Token::End => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Token::Key(_) if depth == 0 => keys += 1,
                _ => {}
            }
        }
        // Maps occupy two keys per logical entry.
        if matches!(
            descriptor.kind(),
            crate::descriptor::SerialKind::Structure(crate::descriptor::StructureKind::Map)
        ) {
            keys /= 2;
        }
        Ok(Some(keys))
    }

    token_decode_element! {
        decode_bool_element => decode_bool: bool,
        decode_i8_element => decode_i8: i8,
        decode_i16_element => decode_i16: i16,
        decode_i32_element => decode_i32: i32,
        decode_i64_element => decode_i64: i64,
        decode_f32_element => decode_f32: f32,
        decode_f64_element => decode_f64: f64,
        decode_char_element => decode_char: char,
        decode_str_element => decode_string: String,
    }

    fn decode_serializable_element(
        &mut self,
        _descriptor: &SerialDescriptor,
        _index: usize,
        slot: &mut dyn DecodeSlot,
    ) -> SerialResult<()> {
        self.consume_key();
        slot.decode_value(self)
    }

    fn decode_nullable_serializable_element(
        &mut self,
        _descriptor: &SerialDescriptor,
        _index: usize,
        slot: &mut dyn DecodeSlot,
    ) -> SerialResult<()> {
        self.consume_key();
        if self.decode_not_null_mark()? {
            slot.decode_value(self)
        } else {
            self.decode_null()?;
            slot.set_null()
        }
    }

    fn end_structure(&mut self, _descriptor: &SerialDescriptor) -> SerialResult<()> {
        match self.next_token()? {
            Token::End => Ok(()),
            other => Err(SerialError::custom(format!(
                "expected the end of a structure, found {other:?}",
            ))),
        }
    }
}

// -----------------------------------------------------------------------------
// Round-trip helpers

pub(crate) fn encode<T: ?Sized>(
    strategy: &dyn SerializeStrategy<T>,
    value: &T,
) -> Vec<Token> {
    let mut encoder = TokenEncoder::new();
    strategy.serialize(&mut encoder, value).expect("encoding failed");
    encoder.tokens
}

pub(crate) fn decode<T>(strategy: &dyn DeserializeStrategy<T>, tokens: Vec<Token>) -> T {
    let mut decoder = TokenDecoder::new(tokens);
    strategy.deserialize(&mut decoder).expect("decoding failed")
}

pub(crate) fn round_trip<T>(codec: &dyn Codec<T>, value: &T) -> T {
    decode(codec, encode(codec, value))
}

// -----------------------------------------------------------------------------
// NewtypeCodec (test fixture)

/// A hand-written single-field class codec, standing in for what a codec
/// generator would emit.
pub(crate) struct NewtypeCodec<W, P> {
    descriptor: SerialDescriptor,
    inner: Arc<dyn Codec<P>>,
    get: for<'a> fn(&'a W) -> &'a P,
    make: fn(P) -> W,
}

impl<W, P> NewtypeCodec<W, P> {
    pub(crate) fn new(
        serial_name: &'static str,
        field: &'static str,
        inner: Arc<dyn Codec<P>>,
        get: for<'a> fn(&'a W) -> &'a P,
        make: fn(P) -> W,
    ) -> Self {
        let descriptor = build_class_serial_descriptor(serial_name, |b| {
            b.element(field, inner.descriptor());
        });
        Self {
            descriptor,
            inner,
            get,
            make,
        }
    }
}

impl<W, P> Described for NewtypeCodec<W, P> {
    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }
}

impl<W: 'static, P: 'static> SerializeStrategy<W> for NewtypeCodec<W, P> {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &W) -> SerialResult<()> {
        let composite = encoder.begin_structure(&self.descriptor)?;
        composite.encode_serializable_element(
            &self.descriptor,
            0,
            &encodable(self.inner.as_ref(), (self.get)(value)),
        )?;
        composite.end_structure(&self.descriptor)
    }
}

impl<W: 'static, P: 'static> DeserializeStrategy<W> for NewtypeCodec<W, P> {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<W> {
        let composite = decoder.begin_structure(&self.descriptor)?;
        let mut payload: Option<P> = None;

        if composite.decode_sequentially() {
            let mut slot = Slot::new(self.inner.as_ref());
            composite.decode_serializable_element(&self.descriptor, 0, &mut slot)?;
            payload = slot.take();
        } else {
            loop {
                match composite.decode_element_index(&self.descriptor)? {
                    ElementIndex::Index(0) => {
                        let mut slot = Slot::new(self.inner.as_ref());
                        composite.decode_serializable_element(&self.descriptor, 0, &mut slot)?;
                        payload = slot.take();
                    }
                    ElementIndex::Index(other) => {
                        return Err(SerialError::custom(format!(
                            "invalid element index {other} while decoding `{}`",
                            self.descriptor.serial_name(),
                        )));
                    }
                    ElementIndex::Unknown => continue,
                    ElementIndex::Done => break,
                }
            }
        }
        composite.end_structure(&self.descriptor)?;

        match payload {
            Some(payload) => Ok((self.make)(payload)),
            None => Err(SerialError::MissingFields {
                serial_name: self.descriptor.serial_name().to_owned(),
                fields: vec![self.descriptor.element_name(0).to_owned()],
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Shape fixtures (open polymorphism)

pub(crate) trait Shape: crate::poly::PolymorphicValue {
    fn area(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Circle {
    pub(crate) radius: f64,
}

impl Shape for Circle {
    fn area(&self) -> f64 {
        core::f64::consts::PI * self.radius * self.radius
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Square {
    pub(crate) side: f64,
}

impl Shape for Square {
    fn area(&self) -> f64 {
        self.side * self.side
    }
}

pub(crate) fn circle_codec() -> Arc<dyn Codec<Circle>> {
    Arc::new(NewtypeCodec::new(
        "Circle",
        "radius",
        Arc::new(crate::builtins::F64Codec),
        |c: &Circle| &c.radius,
        |radius| Circle { radius },
    ))
}

pub(crate) fn square_codec() -> Arc<dyn Codec<Square>> {
    Arc::new(NewtypeCodec::new(
        "Square",
        "side",
        Arc::new(crate::builtins::F64Codec),
        |s: &Square| &s.side,
        |side| Square { side },
    ))
}

/// A module with both shapes registered under the `dyn Shape` scope.
pub(crate) fn shape_module() -> SerializersModule {
    SerializersModule::builder()
        .polymorphic::<dyn Shape, Circle>(circle_codec(), |c| Box::new(c))
        .polymorphic::<dyn Shape, Square>(square_codec(), |s| Box::new(s))
        .build()
}

// -----------------------------------------------------------------------------
// Data1 fixture

/// The canonical two-field class: an optional defaulted list and a
/// required string.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Data1 {
    pub(crate) l: Vec<i32>,
    pub(crate) s: String,
}

pub(crate) struct Data1Codec {
    descriptor: SerialDescriptor,
    list: Arc<dyn Codec<Vec<i32>>>,
}

impl Data1Codec {
    pub(crate) fn new() -> Self {
        Self::build(None)
    }

    /// Variant with an [`EncodeDefault`] annotation on the `l` element.
    pub(crate) fn with_l_annotation(mode: EncodeDefault) -> Self {
        Self::build(Some(mode))
    }

    fn build(annotation: Option<EncodeDefault>) -> Self {
        let list: Arc<dyn Codec<Vec<i32>>> = crate::lookup::codec_of::<Vec<i32>>();
        let list_descriptor = list.descriptor();
        let descriptor = build_class_serial_descriptor("Data1", |b| {
            let annotations = match annotation {
                Some(mode) => Annotations::new().with(mode),
                None => Annotations::new(),
            };
            b.element_with("l", list_descriptor, annotations, true);
            b.element("s", crate::builtins::StringCodec.descriptor());
        });
        Self { descriptor, list }
    }
}

impl Described for Data1Codec {
    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }
}

impl SerializeStrategy<Data1> for Data1Codec {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &Data1) -> SerialResult<()> {
        let composite = encoder.begin_structure(&self.descriptor)?;

        // The annotation short-circuits the format query entirely.
        let encode_l = match self.descriptor.element_annotations(0).get::<EncodeDefault>() {
            Some(EncodeDefault::Always) => true,
            Some(EncodeDefault::Never) => false,
            None => {
                !value.l.is_empty() || composite.should_encode_element_default(&self.descriptor, 0)
            }
        };
        if encode_l {
            composite.encode_serializable_element(
                &self.descriptor,
                0,
                &encodable(self.list.as_ref(), &value.l),
            )?;
        }
        composite.encode_str_element(&self.descriptor, 1, &value.s)?;
        composite.end_structure(&self.descriptor)
    }
}

impl DeserializeStrategy<Data1> for Data1Codec {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<Data1> {
        let composite = decoder.begin_structure(&self.descriptor)?;
        let mut l: Option<Vec<i32>> = None;
        let mut s: Option<String> = None;

        if composite.decode_sequentially() {
            let mut slot = Slot::new(self.list.as_ref());
            composite.decode_serializable_element(&self.descriptor, 0, &mut slot)?;
            l = slot.take();
            s = Some(composite.decode_str_element(&self.descriptor, 1)?);
        } else {
            loop {
                match composite.decode_element_index(&self.descriptor)? {
                    ElementIndex::Index(0) => {
                        let mut slot = Slot::new(self.list.as_ref());
                        composite.decode_serializable_element(&self.descriptor, 0, &mut slot)?;
                        l = slot.take();
                    }
                    ElementIndex::Index(1) => {
                        s = Some(composite.decode_str_element(&self.descriptor, 1)?);
                    }
                    ElementIndex::Index(other) => {
                        return Err(SerialError::custom(format!(
                            "invalid element index {other} while decoding `Data1`",
                        )));
                    }
                    ElementIndex::Unknown => continue,
                    ElementIndex::Done => break,
                }
            }
        }
        composite.end_structure(&self.descriptor)?;

        // `l` is optional with a default; `s` is required.
        let s = s.ok_or_else(|| SerialError::MissingFields {
            serial_name: "Data1".to_owned(),
            fields: vec!["s".to_owned()],
        })?;
        Ok(Data1 {
            l: l.unwrap_or_default(),
            s,
        })
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::builtins::{EnumCodec, I32Codec};
    use crate::descriptor::{SerialKind, StructureKind, list_descriptor};
    use crate::lookup::codec_of;

    #[test]
    fn primitive_round_trips() {
        assert_eq!(round_trip(&*codec_of::<bool>(), &true), true);
        assert_eq!(round_trip(&*codec_of::<i8>(), &-3), -3);
        assert_eq!(round_trip(&*codec_of::<i64>(), &i64::MIN), i64::MIN);
        assert_eq!(round_trip(&*codec_of::<f64>(), &2.5), 2.5);
        assert_eq!(round_trip(&*codec_of::<char>(), &'序'), '序');
        assert_eq!(
            round_trip(&*codec_of::<String>(), &"hello".to_owned()),
            "hello",
        );
    }

    #[test]
    fn structural_round_trips() {
        let data = Data1 {
            l: vec![1, 2, 3],
            s: "payload".to_owned(),
        };
        assert_eq!(round_trip(&Data1Codec::new(), &data), data);

        let list = vec![vec![1, 2], vec![], vec![3]];
        assert_eq!(round_trip(&*codec_of::<Vec<Vec<i32>>>(), &list), list);

        let mut map = HashMap::new();
        map.insert("a".to_owned(), vec![1]);
        map.insert("b".to_owned(), vec![2, 3]);
        assert_eq!(round_trip(&*codec_of::<HashMap<String, Vec<i32>>>(), &map), map);

        let array = [7i32, 8, 9];
        assert_eq!(round_trip(&*codec_of::<[i32; 3]>(), &array), array);

        let triple = (1i32, "x".to_owned(), Some(false));
        assert_eq!(
            round_trip(&*codec_of::<(i32, String, Option<bool>)>(), &triple),
            triple,
        );
    }

    #[test]
    fn nullable_round_trips() {
        let codec = codec_of::<Option<i32>>();
        assert_eq!(round_trip(&*codec, &Some(5)), Some(5));
        assert_eq!(round_trip(&*codec, &None), None);

        // The mark protocol is visible on the wire.
        assert_eq!(
            encode(&*codec, &Some(5)),
            vec![Token::Mark, Token::Value(Scalar::I32(5))],
        );
        assert_eq!(encode(&*codec, &None), vec![Token::Null]);
    }

    #[test]
    fn enum_round_trip() {
        #[derive(Debug, Clone, PartialEq)]
        enum Level {
            Low,
            High,
        }

        let codec = EnumCodec::new("Level", vec![("Low", Level::Low), ("High", Level::High)]);
        assert_eq!(round_trip(&codec, &Level::High), Level::High);
        assert_eq!(codec.descriptor().kind(), SerialKind::Enum);
    }

    #[test]
    fn indexed_and_sequential_decoding_agree() {
        let data = Data1 {
            l: vec![4, 5],
            s: "both".to_owned(),
        };
        let codec = Data1Codec::new();
        let tokens = encode(&codec, &data);

        let mut indexed = TokenDecoder::new(tokens.clone());
        let via_indexed = codec.deserialize(&mut indexed).unwrap();

        let mut sequential = TokenDecoder::new(tokens).sequentially();
        let via_sequential = codec.deserialize(&mut sequential).unwrap();

        assert_eq!(via_indexed, via_sequential);
        assert_eq!(via_indexed, data);
    }

    #[test]
    fn defaulted_element_is_omitted_when_the_format_skips_defaults() {
        let data = Data1 {
            l: Vec::new(),
            s: "only".to_owned(),
        };
        let codec = Data1Codec::new();

        let mut skipping = TokenEncoder::new().skip_defaults();
        codec.serialize(&mut skipping, &data).unwrap();
        assert!(!skipping.tokens.contains(&Token::Key("l".to_owned())));

        let mut keeping = TokenEncoder::new();
        codec.serialize(&mut keeping, &data).unwrap();
        assert!(keeping.tokens.contains(&Token::Key("l".to_owned())));

        // Either way the value decodes back with its default.
        let decoded = decode(&codec, skipping.tokens);
        assert_eq!(decoded, data);
    }

    #[test]
    fn encode_default_annotation_overrides_the_format() {
        let data = Data1 {
            l: Vec::new(),
            s: "x".to_owned(),
        };

        // `Always` wins over a default-skipping format.
        let codec = Data1Codec::with_l_annotation(EncodeDefault::Always);
        let mut encoder = TokenEncoder::new().skip_defaults();
        codec.serialize(&mut encoder, &data).unwrap();
        assert!(encoder.tokens.contains(&Token::Key("l".to_owned())));

        // `Never` wins even for non-default values under a keeping format.
        let populated = Data1 {
            l: vec![1],
            s: "x".to_owned(),
        };
        let codec = Data1Codec::with_l_annotation(EncodeDefault::Never);
        let mut encoder = TokenEncoder::new();
        codec.serialize(&mut encoder, &populated).unwrap();
        assert!(!encoder.tokens.contains(&Token::Key("l".to_owned())));
    }

    #[test]
    fn unknown_elements_are_skipped() {
        let data = Data1 {
            l: vec![1],
            s: "kept".to_owned(),
        };
        let codec = Data1Codec::new();
        let mut tokens = encode(&codec, &data);

        // Inject an element the schema does not know, right after `Begin`.
        tokens.splice(
            1..1,
            [
                Token::Key("w".to_owned()),
                Token::Value(Scalar::I32(9)),
            ],
        );
        assert_eq!(decode(&codec, tokens), data);
    }

    #[test]
    fn missing_required_element_is_structured() {
        let tokens = vec![Token::Begin("Data1".to_owned()), Token::End];
        let mut decoder = TokenDecoder::new(tokens);
        let err = Data1Codec::new().deserialize(&mut decoder).unwrap_err();

        assert_eq!(err.missing_fields(), Some(&["s".to_owned()][..]));
        match err {
            SerialError::MissingFields { serial_name, .. } => assert_eq!(serial_name, "Data1"),
            other => panic!("expected MissingFields, got {other}"),
        }
    }

    #[test]
    fn manual_descriptor_matches_the_codec_descriptor() {
        let manual = build_class_serial_descriptor("Data1", |b| {
            b.optional_element("l", list_descriptor("Vec", I32Codec.descriptor()));
            b.element("s", crate::builtins::StringCodec.descriptor());
        });

        assert_eq!(manual.elements_count(), 2);
        assert_eq!(manual.element_name(0), "l");
        assert!(manual.is_element_optional(0));
        assert_eq!(
            manual.element_descriptor(0).kind(),
            SerialKind::Structure(StructureKind::List),
        );
        assert_eq!(manual, Data1Codec::new().descriptor());
    }
}
