use crate::attributes::{
    ComponentAliasAttributes, ComponentAttributes, DefaultDefinition, FieldAttributes,
};
use convert_case::{Case, Casing};
use itertools::Itertools;
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use std::ops::Deref;
use syn::spanned::Spanned;
use syn::{
    Attribute, Data, DataStruct, DeriveInput, Error, Expr, ExprArray, ExprLit, Field, Fields,
    FieldsNamed, FieldsUnnamed, GenericArgument, Item, Lit, LitStr, PathArguments, Result, Type,
    TypePath,
};

const COMPONENT: &str = "component";

fn wrapped_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    if let Type::Path(TypePath { qself: None, path }) = ty {
        let segment = path.segments.last()?;
        if segment.ident != wrapper {
            return None;
        }

        if let PathArguments::AngleBracketed(arguments) = &segment.arguments {
            return arguments.args.iter().find_map(|argument| {
                if let GenericArgument::Type(ty) = argument {
                    Some(ty)
                } else {
                    None
                }
            });
        }
    }

    None
}

fn get_instance(ty: &Type, name: Option<&LitStr>) -> TokenStream {
    if let Some(ty) = wrapped_type(ty, "Option") {
        return match name {
            Some(name) => quote! {
                instance_provider.instance_by_name_option::<<#ty as std::ops::Deref>::Target>(#name)?
            },
            None => quote! {
                instance_provider.primary_instance_option::<<#ty as std::ops::Deref>::Target>()?
            },
        };
    }

    if let Some(ty) = wrapped_type(ty, "Vec") {
        return quote! {
            instance_provider.instances_typed::<<#ty as std::ops::Deref>::Target>()?
        };
    }

    match name {
        Some(name) => quote! {
            instance_provider.instance_by_name_typed::<<#ty as std::ops::Deref>::Target>(#name)?
        },
        None => quote! {
            instance_provider.primary_instance_typed::<<#ty as std::ops::Deref>::Target>()?
        },
    }
}

fn generate_construction(field: &Field) -> Result<TokenStream> {
    let mut name = None;
    for attr in &field.attrs {
        if attr.path().is_ident(COMPONENT) {
            let attributes = FieldAttributes::try_from(attr)?;
            match &attributes.default {
                Some(DefaultDefinition::Expr(path)) => return Ok(quote!(#path())),
                Some(DefaultDefinition::Default) => {
                    return Ok(quote!(std::default::Default::default()))
                }
                _ => {}
            }

            name = attributes.name;
        }
    }

    if name.is_some() && wrapped_type(&field.ty, "Vec").is_some() {
        return Err(Error::new(
            field.span(),
            "Named injection is not supported for collections!",
        ));
    }

    Ok(get_instance(&field.ty, name.as_ref()))
}

fn make_named_struct(fields: &FieldsNamed) -> Result<TokenStream> {
    let fields: Vec<_> = fields
        .named
        .iter()
        .map(|field| -> Result<TokenStream> {
            let ident = field
                .ident
                .as_ref()
                .ok_or_else(|| Error::new(field.span(), "Missing field name!"))?;
            let instance = generate_construction(field)?;
            Ok(quote! {
                #ident: #instance
            })
        })
        .try_collect()?;

    Ok(quote! {
        Self {
            #(#fields),*
        }
    })
}

fn make_unnamed_struct(fields: &FieldsUnnamed) -> Result<TokenStream> {
    let fields: Vec<_> = fields
        .unnamed
        .iter()
        .map(generate_construction)
        .try_collect()?;

    Ok(quote! {
        Self(#(#fields),*)
    })
}

fn extract_component_attributes(attributes: &[Attribute]) -> Result<Option<ComponentAttributes>> {
    attributes
        .iter()
        .filter_map(|attribute| {
            if attribute.path().is_ident(COMPONENT) {
                Some(ComponentAttributes::try_from(attribute))
            } else {
                None
            }
        })
        .next()
        .transpose()
}

fn generate_names(attribute_names: Option<ExprArray>, ident: &Ident) -> Vec<String> {
    attribute_names
        .map(|names| {
            names
                .elems
                .iter()
                .filter_map(|elem| {
                    if let Expr::Lit(ExprLit {
                        lit: Lit::Str(string),
                        ..
                    }) = elem
                    {
                        Some(string.value())
                    } else {
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_else(|| vec![ident.to_string().to_case(Case::Snake)])
}

fn generate_after_inject(method: Option<Ident>) -> TokenStream {
    method
        .map(|method| {
            quote! {
                fn after_inject(
                    &mut self,
                    instance_provider: &mut dyn paramscope_di::instance_provider::ComponentInstanceProvider,
                ) -> Result<(), paramscope_di::ComponentInstanceProviderError> {
                    self.#method(instance_provider)
                }
            }
        })
        .unwrap_or_default()
}

pub fn expand_component(input: &DeriveInput) -> Result<TokenStream> {
    if let Data::Struct(DataStruct { fields, .. }) = &input.data {
        let ident = &input.ident;
        let generation = match fields {
            Fields::Named(fields) => make_named_struct(fields)?,
            Fields::Unnamed(fields) => make_unnamed_struct(fields)?,
            Fields::Unit => quote! { Self },
        };

        let ComponentAttributes {
            names,
            scope,
            after_inject,
        } = extract_component_attributes(&input.attrs)?.unwrap_or_default();

        let names = generate_names(names, ident);
        let scope = scope
            .map(|scope| quote!(#scope))
            .unwrap_or_else(|| quote!(paramscope_di::scope::SINGLETON));
        let after_inject = generate_after_inject(after_inject);

        Ok(quote! {
            #[automatically_derived]
            impl paramscope_di::component::Injectable for #ident {}

            #[automatically_derived]
            impl paramscope_di::component::ComponentDowncast<#ident> for #ident {
                fn downcast(
                    source: paramscope_di::instance_provider::ComponentInstanceAnyPtr,
                ) -> Result<paramscope_di::instance_provider::ComponentInstancePtr<Self>, paramscope_di::instance_provider::ComponentInstanceAnyPtr> {
                    source.downcast()
                }
            }

            #[automatically_derived]
            impl paramscope_di::component::Component for #ident {
                #[allow(unused_variables, unused_imports)]
                fn create(
                    instance_provider: &mut dyn paramscope_di::instance_provider::ComponentInstanceProvider,
                ) -> Result<Self, paramscope_di::ComponentInstanceProviderError> {
                    use paramscope_di::instance_provider::TypedComponentInstanceProvider;
                    Ok(#generation)
                }

                #after_inject
            }

            const _: () = {
                fn register() -> paramscope_di::component_registry::internal::TypedComponentDefinition {
                    paramscope_di::component_registry::internal::TypedComponentDefinition {
                        target: std::any::TypeId::of::<#ident>(),
                        target_name: std::any::type_name::<#ident>(),
                        metadata: paramscope_di::component_registry::ComponentMetadata {
                            names: vec![#(#names.to_string()),*],
                            scope_name: #scope.to_string(),
                            constructor: paramscope_di::component_registry::internal::construct::<#ident>,
                            cast: paramscope_di::component_registry::internal::cast::<#ident, #ident>,
                        },
                    }
                }

                paramscope_di::component_registry::internal::submit! {
                    paramscope_di::component_registry::internal::ComponentDefinitionRegisterer {
                        register
                    }
                };
            };
        })
    } else {
        Err(Error::new(
            input.span(),
            "Can only derive Component on structs!",
        ))
    }
}

pub fn generate_injectable(item: &Item) -> Result<TokenStream> {
    if let Item::Trait(item_trait) = item {
        let ident = &item_trait.ident;

        Ok(quote! {
            #item

            #[automatically_derived]
            impl paramscope_di::component::Injectable for dyn #ident + Send + Sync {}
        })
    } else {
        Err(Error::new(
            item.span(),
            "Only traits can be marked as injectable!",
        ))
    }
}

pub fn register_component_alias(
    item: &Item,
    args: &ComponentAliasAttributes,
) -> Result<TokenStream> {
    if let Item::Impl(item_impl) = item {
        let trait_type = item_impl
            .trait_
            .as_ref()
            .map(|(_, path, ..)| path)
            .ok_or_else(|| Error::new(item.span(), "Missing trait identifier!"))?;

        let target_type = if let Type::Path(path) = item_impl.self_ty.deref() {
            &path.path
        } else {
            return Err(Error::new(
                item.span(),
                "Registering traits is only available for Components!",
            ));
        };

        let is_primary = args.is_primary;
        let name = args
            .name
            .as_ref()
            .map(|name| quote!(Some(#name.to_string())))
            .unwrap_or_else(|| quote!(None));

        Ok(quote! {
            #item

            #[automatically_derived]
            impl paramscope_di::component::ComponentDowncast<#target_type> for dyn #trait_type + Send + Sync {
                fn downcast(
                    source: paramscope_di::instance_provider::ComponentInstanceAnyPtr,
                ) -> Result<paramscope_di::instance_provider::ComponentInstancePtr<Self>, paramscope_di::instance_provider::ComponentInstanceAnyPtr> {
                    source.downcast::<#target_type>().map(|p| p as paramscope_di::instance_provider::ComponentInstancePtr<Self>)
                }
            }

            const _: () = {
                fn register() -> paramscope_di::component_registry::internal::ComponentAliasDefinition {
                    paramscope_di::component_registry::internal::ComponentAliasDefinition {
                        alias_type: std::any::TypeId::of::<dyn #trait_type + Send + Sync>(),
                        target_type: std::any::TypeId::of::<#target_type>(),
                        alias_name: std::any::type_name::<dyn #trait_type + Send + Sync>(),
                        target_name: std::any::type_name::<#target_type>(),
                        metadata: paramscope_di::component_registry::ComponentAliasMetadata {
                            is_primary: #is_primary,
                            name: #name,
                            cast: paramscope_di::component_registry::internal::cast::<dyn #trait_type + Send + Sync, #target_type>,
                        },
                    }
                }

                paramscope_di::component_registry::internal::submit! {
                    paramscope_di::component_registry::internal::ComponentAliasRegisterer {
                        register
                    }
                };
            };
        })
    } else {
        Err(Error::new(
            item.span(),
            "Registering traits for components is possible only on trait implementations!",
        ))
    }
}
