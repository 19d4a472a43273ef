/// Creates a single chat [`Message`](crate::Message) from a role shorthand.
///
/// Tool results name the call they answer: `tool(call_id, tool_name) => content`.
///
/// ```rust
/// use parley::{Role, parley_msg};
///
/// let message = parley_msg!(assistant => "Done.");
/// assert_eq!(message.role, Role::Assistant);
/// assert_eq!(message.text(), Some("Done."));
///
/// let result = parley_msg!(tool("call-1", "search") => "3 hits");
/// assert_eq!(result.tool_call_id.as_deref(), Some("call-1"));
/// ```
#[macro_export]
macro_rules! parley_msg {
    (system => $content:expr $(,)?) => {
        $crate::Message::system($content)
    };
    (user => $content:expr $(,)?) => {
        $crate::Message::user($content)
    };
    (assistant => $content:expr $(,)?) => {
        $crate::Message::assistant($content)
    };
    (tool($call_id:expr, $name:expr) => $content:expr $(,)?) => {
        $crate::Message::tool_result($call_id, $name, $content)
    };
    ($role:ident => $content:expr $(,)?) => {
        compile_error!("unsupported role: use system, user, assistant, or tool(call_id, name)");
    };
}

/// Creates a `Vec<Message>` from role/content pairs.
///
/// ```rust
/// use parley::{Role, parley_messages};
///
/// let messages = parley_messages![
///     system => "You are concise.",
///     user => "Summarize this repository.",
/// ];
///
/// assert_eq!(messages.len(), 2);
/// assert_eq!(messages[0].role, Role::System);
/// assert_eq!(messages[1].role, Role::User);
/// ```
#[macro_export]
macro_rules! parley_messages {
    () => {
        Vec::<$crate::Message>::new()
    };
    ($($role:ident $(($($arg:expr),+))? => $content:expr),+ $(,)?) => {
        vec![$($crate::parley_msg!($role $(($($arg),+))? => $content)),+]
    };
}
