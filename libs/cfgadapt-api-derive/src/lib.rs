use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Data, DeriveInput, Field, Fields, GenericArgument, Ident, LitStr, PathArguments, Type,
    parse_macro_input,
};

/// Derive macro for config parameter declarations.
///
/// Generates three methods on the annotated struct:
///
/// - `config_params() -> Vec<ConfigParam>`: parameter declarations.
/// - `from_config(&ConfigValues) -> Result<Self, ConfigError>`: reads typed values.
/// - `to_config(&self) -> ConfigValues`: the struct as config values, ready to encode.
///
/// The struct must implement `Default`; its values become the defaults of
/// parameters not marked `required`.
///
/// # Example
///
/// ```ignore
/// #[derive(ConfigParams, Default)]
/// pub struct ServerConfig {
///     #[param(description = "Idle connection timeout")]
///     pub idle_timeout: TimeDelta,
///
///     #[param(required, description = "Worker count")]
///     pub workers: u64,
/// }
/// ```
///
/// Supported field types: `bool`, `i64`, `u64`, `usize`, `f64`, `String`,
/// `TimeDelta`, `DateTime<FixedOffset>`, `IpAddr`.
#[proc_macro_derive(ConfigParams, attributes(param))]
pub fn derive_config_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(ident, "ConfigParams can only be derived for structs"));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(ident, "ConfigParams needs named fields"));
    };

    let fields = named
        .named
        .iter()
        .map(ParamField::parse)
        .collect::<syn::Result<Vec<_>>>()?;

    let declarations = fields.iter().map(ParamField::declaration);
    let reads = fields.iter().map(ParamField::read);
    let writes = fields.iter().map(ParamField::write);

    Ok(quote! {
        impl #ident {
            pub fn config_params() -> Vec<cfgadapt_api::config::ConfigParam> {
                let __defaults = Self::default();
                vec![#(#declarations),*]
            }

            pub fn from_config(
                __values: &cfgadapt_api::config::ConfigValues,
            ) -> Result<Self, cfgadapt_api::error::ConfigError> {
                let mut __this = Self::default();
                #(#reads)*
                Ok(__this)
            }

            pub fn to_config(&self) -> cfgadapt_api::config::ConfigValues {
                let mut __values = cfgadapt_api::config::ConfigValues::new();
                #(#writes)*
                __values
            }
        }
    })
}

/// Rust field types the derive understands.
#[derive(Clone, Copy)]
enum Kind {
    Bool,
    I64,
    U64,
    Usize,
    F64,
    Str,
    Duration,
    Timestamp,
    Ip,
}

impl Kind {
    fn of(ty: &Type) -> Option<Self> {
        let Type::Path(path) = ty else {
            return None;
        };
        let last = path.path.segments.last()?;
        Some(match last.ident.to_string().as_str() {
            "bool" => Kind::Bool,
            "i64" => Kind::I64,
            "u64" => Kind::U64,
            "usize" => Kind::Usize,
            "f64" => Kind::F64,
            "String" => Kind::Str,
            "TimeDelta" => Kind::Duration,
            "DateTime" if has_fixed_offset(&last.arguments) => Kind::Timestamp,
            "IpAddr" => Kind::Ip,
            _ => return None,
        })
    }

    fn param_type(self) -> TokenStream2 {
        let variant = match self {
            Kind::Bool => quote!(Bool),
            Kind::I64 => quote!(I64),
            Kind::U64 | Kind::Usize => quote!(U64),
            Kind::F64 => quote!(F64),
            Kind::Str => quote!(Str),
            Kind::Duration => quote!(Duration),
            Kind::Timestamp => quote!(Timestamp),
            Kind::Ip => quote!(Ip),
        };
        quote!(cfgadapt_api::value::ParamType::#variant)
    }

    fn getter(self) -> TokenStream2 {
        match self {
            Kind::Bool => quote!(get_bool),
            Kind::I64 => quote!(get_i64),
            Kind::U64 | Kind::Usize => quote!(get_u64),
            Kind::F64 => quote!(get_f64),
            Kind::Str => quote!(get_str),
            Kind::Duration => quote!(get_duration),
            Kind::Timestamp => quote!(get_timestamp),
            Kind::Ip => quote!(get_ip),
        }
    }

    /// `ParamValue` holding the field at `place`.
    fn to_value(self, place: TokenStream2) -> TokenStream2 {
        let pv = quote!(cfgadapt_api::value::ParamValue);
        match self {
            Kind::Bool => quote!(#pv::Bool(#place)),
            Kind::I64 => quote!(#pv::I64(#place)),
            Kind::U64 => quote!(#pv::U64(#place)),
            Kind::Usize => quote!(#pv::U64(#place as u64)),
            Kind::F64 => quote!(#pv::F64(#place)),
            Kind::Str => quote!(#pv::Str(#place.clone())),
            Kind::Duration => quote!(#pv::Duration(#place)),
            Kind::Timestamp => quote!(#pv::Timestamp(#place)),
            Kind::Ip => quote!(#pv::Ip(#place)),
        }
    }

    /// Field value from a getter result bound to `v`.
    fn from_getter(self) -> TokenStream2 {
        match self {
            Kind::Usize => quote!(v as usize),
            Kind::Str => quote!(v.to_owned()),
            _ => quote!(v),
        }
    }
}

/// `<FixedOffset>`, the only time zone `ParamValue::Timestamp` carries.
fn has_fixed_offset(args: &PathArguments) -> bool {
    let PathArguments::AngleBracketed(args) = args else {
        return false;
    };
    let mut types = args.args.iter();
    match (types.next(), types.next()) {
        (Some(GenericArgument::Type(Type::Path(tz))), None) => tz
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == "FixedOffset" && seg.arguments.is_none()),
        _ => false,
    }
}

struct ParamField {
    ident: Ident,
    kind: Kind,
    required: bool,
    description: String,
}

impl ParamField {
    fn parse(field: &Field) -> syn::Result<Self> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new_spanned(field, "field has no name"))?;

        let mut description = None;
        let mut required = false;
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("param")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("required") {
                    required = true;
                    return Ok(());
                }
                if meta.path.is_ident("description") {
                    let lit: LitStr = meta.value()?.parse()?;
                    description = Some(lit.value());
                    return Ok(());
                }
                Err(meta.error("expected `description = \"...\"` or `required`"))
            })?;
        }

        let Some(description) = description else {
            return Err(syn::Error::new_spanned(
                &ident,
                "config parameter needs #[param(description = \"...\")]",
            ));
        };
        let kind = Kind::of(&field.ty).ok_or_else(|| {
            syn::Error::new_spanned(
                &field.ty,
                "ConfigParams supports bool, i64, u64, usize, f64, String, \
                 TimeDelta, DateTime<FixedOffset> and IpAddr fields",
            )
        })?;

        Ok(Self {
            ident,
            kind,
            required,
            description,
        })
    }

    fn key(&self) -> String {
        self.ident.to_string()
    }

    fn declaration(&self) -> TokenStream2 {
        let ident = &self.ident;
        let key = self.key();
        let param_type = self.kind.param_type();
        let required = self.required;
        let description = &self.description;
        let default = if required {
            quote!(None)
        } else {
            let value = self.kind.to_value(quote!(__defaults.#ident));
            quote!(Some(#value))
        };

        quote! {
            cfgadapt_api::config::ConfigParam {
                name: #key.to_owned(),
                param_type: #param_type,
                required: #required,
                default: #default,
                description: #description.to_owned(),
            }
        }
    }

    fn read(&self) -> TokenStream2 {
        let ident = &self.ident;
        let key = self.key();
        let getter = self.kind.getter();
        let convert = self.kind.from_getter();

        if self.required {
            quote! {
                let v = __values.#getter(#key).ok_or_else(|| {
                    cfgadapt_api::error::ConfigError::Config(
                        format!("missing required parameter '{}'", #key)
                    )
                })?;
                __this.#ident = #convert;
            }
        } else {
            quote! {
                if let Some(v) = __values.#getter(#key) {
                    __this.#ident = #convert;
                }
            }
        }
    }

    fn write(&self) -> TokenStream2 {
        let ident = &self.ident;
        let key = self.key();
        let value = self.kind.to_value(quote!(self.#ident));
        quote! {
            __values.set(#key, #value);
        }
    }
}
