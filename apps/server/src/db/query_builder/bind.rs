use super::BindValue;

pub(super) fn push_int(bind_params: &mut Vec<BindValue>, value: i64) -> usize {
    bind_params.push(BindValue::Int(value));
    bind_params.len()
}

pub(super) fn push_text(bind_params: &mut Vec<BindValue>, value: String) -> usize {
    bind_params.push(BindValue::Text(value));
    bind_params.len()
}

pub(super) fn push_int_array(bind_params: &mut Vec<BindValue>, value: Vec<i64>) -> usize {
    bind_params.push(BindValue::IntArray(value));
    bind_params.len()
}
