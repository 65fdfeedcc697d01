//! Declarative macros for UPnP operation definitions
//!
//! Each invocation generates the request struct, the zero-sized operation type
//! and its [`UPnPOperation`](crate::operation::UPnPOperation) impl, plus a
//! snake-case constructor for the request. `InstanceID` is always sent first
//! and is always 0 for renderers with a single transport instance.
//! Request types must implement [`Validate`](crate::operation::Validate).

/// Define an operation with hand-written argument building and parsing
///
/// # Example
/// ```rust,ignore
/// define_upnp_operation! {
///     operation: SeekOperation,
///     action: "Seek",
///     service: AVTransport,
///     request: {
///         target_millis: i64,
///     },
///     response: (),
///     args: |req| vec![arg("Unit", "REL_TIME"), arg("Target", format_rel_time(req.target_millis))],
///     parse: |_response| Ok(()),
/// }
/// ```
#[macro_export]
macro_rules! define_upnp_operation {
    (
        operation: $op_struct:ident,
        action: $action:literal,
        service: $service:ident,
        request: {
            $($field:ident: $field_type:ty),* $(,)?
        },
        response: $response_type:ty,
        args: |$req_param:ident| $args_expr:expr,
        parse: |$resp_param:ident| $parse_expr:expr $(,)?
    ) => {
        paste! {
            #[derive(Clone, Debug, PartialEq)]
            pub struct [<$op_struct Request>] {
                $(pub $field: $field_type,)*
                pub instance_id: u32,
            }

            pub struct $op_struct;

            impl $crate::operation::UPnPOperation for $op_struct {
                type Request = [<$op_struct Request>];
                type Response = $response_type;

                const SERVICE: $crate::service::Service = $crate::service::Service::$service;
                const ACTION: &'static str = $action;

                fn build_args(request: &Self::Request) -> Result<$crate::transport::ActionArgs, $crate::operation::ValidationError> {
                    $crate::operation::Validate::validate(request)?;
                    let $req_param = request;
                    let mut args = vec![("InstanceID".to_string(), request.instance_id.to_string())];
                    let rest: Vec<(String, String)> = $args_expr;
                    args.extend(rest);
                    Ok(args)
                }

                #[allow(unused_variables)]
                fn parse_response(response: &$crate::transport::ActionResponse) -> Result<Self::Response, $crate::error::ControlError> {
                    let $resp_param = response;
                    $parse_expr
                }
            }

            pub fn [<$op_struct:snake>]($($field: $field_type),*) -> [<$op_struct Request>] {
                [<$op_struct Request>] {
                    $($field,)*
                    instance_id: 0,
                }
            }
        }
    };
}

/// Define an operation whose arguments and outputs map field-by-field
///
/// Request fields are sent in declaration order under their wire names;
/// every response field is required and parsed with `FromStr`.
///
/// # Example
/// ```rust,ignore
/// define_operation_with_response! {
///     operation: GetVolumeOperation,
///     action: "GetVolume",
///     service: RenderingControl,
///     request: {
///         channel: String => "Channel",
///     },
///     response: GetVolumeResponse {
///         current_volume: u16,
///     },
///     xml_mapping: {
///         current_volume: "CurrentVolume",
///     },
/// }
/// ```
#[macro_export]
macro_rules! define_operation_with_response {
    (
        operation: $op_struct:ident,
        action: $action:literal,
        service: $service:ident,
        request: {
            $($field:ident: $field_type:ty => $wire:literal),* $(,)?
        },
        response: $response_struct:ident {
            $($resp_field:ident: $resp_type:ty),* $(,)?
        },
        xml_mapping: {
            $($xml_field:ident: $xml_path:literal),* $(,)?
        } $(,)?
    ) => {
        paste! {
            #[derive(Clone, Debug, PartialEq)]
            pub struct [<$op_struct Request>] {
                $(pub $field: $field_type,)*
                pub instance_id: u32,
            }

            #[derive(Debug, Clone, PartialEq)]
            pub struct $response_struct {
                $(pub $resp_field: $resp_type,)*
            }

            pub struct $op_struct;

            impl $crate::operation::UPnPOperation for $op_struct {
                type Request = [<$op_struct Request>];
                type Response = $response_struct;

                const SERVICE: $crate::service::Service = $crate::service::Service::$service;
                const ACTION: &'static str = $action;

                fn build_args(request: &Self::Request) -> Result<$crate::transport::ActionArgs, $crate::operation::ValidationError> {
                    $crate::operation::Validate::validate(request)?;

                    #[allow(unused_mut)]
                    let mut args = vec![("InstanceID".to_string(), request.instance_id.to_string())];
                    $(args.push(($wire.to_string(), request.$field.to_string()));)*
                    Ok(args)
                }

                fn parse_response(response: &$crate::transport::ActionResponse) -> Result<Self::Response, $crate::error::ControlError> {
                    $(let $xml_field = $crate::operation::required(response, $action, $xml_path)?;)*

                    Ok($response_struct {
                        $($resp_field: $xml_field,)*
                    })
                }
            }

            pub fn [<$op_struct:snake>]($($field: $field_type),*) -> [<$op_struct Request>] {
                [<$op_struct Request>] {
                    $($field,)*
                    instance_id: 0,
                }
            }
        }
    };
}
