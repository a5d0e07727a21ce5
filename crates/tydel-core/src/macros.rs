/// Build [`Props`](crate::instance::Props) from key/value pairs. Values
/// take anything `Into<FieldValue>`: plain data, live instances, nested
/// `props!` maps, or `Vec<FieldValue>` for array fields.
///
/// ```ignore
/// let props = props! {
///     "id" => "1",
///     "profile" => props! { "name" => "foo" },
/// };
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::instance::Props::new()
    };
    ( $( $key:expr => $value:expr ),+ $(,)? ) => {{
        let mut props = $crate::instance::Props::new();
        $( props.insert($key, $value); )+
        props
    }};
}
