use proc_macro::TokenStream;

mod delegate;

/// 委托宿主派生宏
/// - 为结构体实现 `::delegation_core::host::Delegate`，`delegation()` 返回注册表字段
/// - 注册表字段：标注 `#[delegate]` 的字段；未标注时取唯一一个类型为 `DelegationRegistry<..>` 的字段
/// - 根节点类型取自字段类型 `DelegationRegistry<Self, Root>` 的第二个泛型参数，
///   也可通过 `#[delegate(root = Type)]` 显式指定（字段使用类型别名时需要）
#[proc_macro_derive(Delegate, attributes(delegate))]
pub fn derive_delegate(input: TokenStream) -> TokenStream {
    delegate::expand(input)
}
