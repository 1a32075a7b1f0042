//! Handler methods: parameter extractors, return conversion and the `Handler` trait
//! implemented for plain functions of a handler-group.

use crate::error::AppError;
use crate::record::Record;
use crate::response::Envelope;
use crate::store::Instance;

/// Declared parameter shape of a handler method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamShape {
    /// Numeric id bound from the query string.
    Id,
    /// Record bound from the request body; carries the record's qualified name.
    Record(&'static str),
}

/// Declared return shape of a handler method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnShape {
    Envelope,
    Unit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub params: Vec<ParamShape>,
    pub returns: ReturnShape,
}

/// A bound argument.
#[derive(Clone, Debug)]
pub enum Arg {
    Id(i64),
    Record(Instance),
}

/// A handler parameter type.
pub trait Param: Sized + 'static {
    fn shape() -> ParamShape;
    fn from_arg(arg: Arg) -> Result<Self, AppError>;
}

/// Numeric id taken from the query string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Id(pub i64);

impl Param for Id {
    fn shape() -> ParamShape {
        ParamShape::Id
    }

    fn from_arg(arg: Arg) -> Result<Self, AppError> {
        match arg {
            Arg::Id(id) => Ok(Id(id)),
            Arg::Record(_) => Err(AppError::BadRequest("expected an id argument".into())),
        }
    }
}

/// Record built from the request body.
#[derive(Clone, Debug, PartialEq)]
pub struct Body<T>(pub T);

impl<T: Record> Param for Body<T> {
    fn shape() -> ParamShape {
        ParamShape::Record(T::NAME)
    }

    fn from_arg(arg: Arg) -> Result<Self, AppError> {
        match arg {
            Arg::Record(instance) => instance.to_record().map(Body),
            Arg::Id(_) => Err(AppError::BadRequest("expected a record argument".into())),
        }
    }
}

/// Conversion of a handler's return value into an optional envelope.
pub trait IntoReply {
    fn shape() -> ReturnShape;
    fn into_reply(self) -> Result<Option<Envelope>, AppError>;
}

impl IntoReply for Envelope {
    fn shape() -> ReturnShape {
        ReturnShape::Envelope
    }

    fn into_reply(self) -> Result<Option<Envelope>, AppError> {
        Ok(Some(self))
    }
}

impl IntoReply for Result<Envelope, AppError> {
    fn shape() -> ReturnShape {
        ReturnShape::Envelope
    }

    fn into_reply(self) -> Result<Option<Envelope>, AppError> {
        self.map(Some)
    }
}

impl IntoReply for () {
    fn shape() -> ReturnShape {
        ReturnShape::Unit
    }

    fn into_reply(self) -> Result<Option<Envelope>, AppError> {
        Ok(None)
    }
}

impl IntoReply for Result<(), AppError> {
    fn shape() -> ReturnShape {
        ReturnShape::Unit
    }

    fn into_reply(self) -> Result<Option<Envelope>, AppError> {
        self.map(|_| None)
    }
}

/// A handler method of group `G`. `M` distinguishes arities.
pub trait Handler<G, M>: Send + Sync + 'static {
    fn params() -> Vec<ParamShape>;
    fn returns() -> ReturnShape;
    fn call(&self, group: &G, args: Vec<Arg>) -> Result<Option<Envelope>, AppError>;
}

fn next_arg(args: &mut std::vec::IntoIter<Arg>) -> Result<Arg, AppError> {
    args.next()
        .ok_or_else(|| AppError::BadRequest("missing handler argument".into()))
}

impl<G, F, R> Handler<G, (R,)> for F
where
    F: Fn(&G) -> R + Send + Sync + 'static,
    R: IntoReply,
{
    fn params() -> Vec<ParamShape> {
        Vec::new()
    }

    fn returns() -> ReturnShape {
        R::shape()
    }

    fn call(&self, group: &G, _args: Vec<Arg>) -> Result<Option<Envelope>, AppError> {
        self(group).into_reply()
    }
}

impl<G, F, R, P1> Handler<G, (R, P1)> for F
where
    F: Fn(&G, P1) -> R + Send + Sync + 'static,
    R: IntoReply,
    P1: Param,
{
    fn params() -> Vec<ParamShape> {
        vec![P1::shape()]
    }

    fn returns() -> ReturnShape {
        R::shape()
    }

    fn call(&self, group: &G, args: Vec<Arg>) -> Result<Option<Envelope>, AppError> {
        let mut args = args.into_iter();
        let p1 = P1::from_arg(next_arg(&mut args)?)?;
        self(group, p1).into_reply()
    }
}

impl<G, F, R, P1, P2> Handler<G, (R, P1, P2)> for F
where
    F: Fn(&G, P1, P2) -> R + Send + Sync + 'static,
    R: IntoReply,
    P1: Param,
    P2: Param,
{
    fn params() -> Vec<ParamShape> {
        vec![P1::shape(), P2::shape()]
    }

    fn returns() -> ReturnShape {
        R::shape()
    }

    fn call(&self, group: &G, args: Vec<Arg>) -> Result<Option<Envelope>, AppError> {
        let mut args = args.into_iter();
        let p1 = P1::from_arg(next_arg(&mut args)?)?;
        let p2 = P2::from_arg(next_arg(&mut args)?)?;
        self(group, p1, p2).into_reply()
    }
}
