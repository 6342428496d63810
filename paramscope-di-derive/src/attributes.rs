use syn::parse::{Parse, ParseStream};
use syn::{Attribute, Error, ExprArray, ExprPath, Ident, LitStr, Token};

pub enum DefaultDefinition {
    Default,
    Expr(ExprPath),
}

#[derive(Default)]
pub struct FieldAttributes {
    pub default: Option<DefaultDefinition>,
    pub name: Option<LitStr>,
}

impl TryFrom<&Attribute> for FieldAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self, Self::Error> {
        let mut result = Self::default();
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                if meta.input.peek(Token![=]) {
                    let value = meta.value()?;
                    let expr: LitStr = value.parse()?;
                    result.default = Some(DefaultDefinition::Expr(expr.parse()?));
                } else {
                    result.default = Some(DefaultDefinition::Default);
                }
            } else if meta.path.is_ident("name") {
                result.name = Some(meta.value().and_then(|value| value.parse())?);
            } else {
                return Err(meta.error("Unsupported field attribute!"));
            }

            Ok(())
        })?;

        Ok(result)
    }
}

#[derive(Default)]
pub struct ComponentAttributes {
    pub names: Option<ExprArray>,
    pub scope: Option<LitStr>,
    pub after_inject: Option<Ident>,
}

impl TryFrom<&Attribute> for ComponentAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self, Self::Error> {
        let mut result = Self::default();
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident("names") {
                result.names = Some(meta.value().and_then(|value| value.parse())?);
            } else if meta.path.is_ident("scope") {
                result.scope = Some(meta.value().and_then(|value| value.parse())?);
            } else if meta.path.is_ident("after_inject") {
                let method: LitStr = meta.value().and_then(|value| value.parse())?;
                result.after_inject = Some(method.parse()?);
            } else {
                return Err(meta.error("Unsupported component attribute!"));
            }

            Ok(())
        })?;

        Ok(result)
    }
}

#[derive(Default)]
pub struct ComponentAliasAttributes {
    pub is_primary: bool,
    pub name: Option<LitStr>,
}

impl Parse for ComponentAliasAttributes {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut result = Self::default();
        while !input.is_empty() {
            let lookahead = input.lookahead1();
            if lookahead.peek(kw::primary) {
                let _ = input.parse::<kw::primary>()?;
                result.is_primary = true;
            } else if lookahead.peek(kw::name) {
                if result.name.is_some() {
                    return Err(Error::new(input.span(), "Name is already defined!"));
                }

                result.name = Some(input.parse::<LitArg<kw::name, LitStr>>()?.value);
            } else if lookahead.peek(Token![,]) {
                let _ = input.parse::<Token![,]>()?;
            } else {
                return Err(lookahead.error());
            }
        }

        Ok(result)
    }
}

struct LitArg<T, A> {
    value: A,
    _p: std::marker::PhantomData<T>,
}

impl<T: Parse, A: Parse> Parse for LitArg<T, A> {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let _ = input.parse::<T>()?;
        let _ = input.parse::<Token![=]>()?;
        let value = input.parse()?;
        Ok(Self {
            value,
            _p: std::marker::PhantomData,
        })
    }
}

mod kw {
    use syn::custom_keyword;

    custom_keyword!(primary);
    custom_keyword!(name);
}
